//! Read-only HTTP API over a running market.

use axum::{
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Json, Response},
	routing::get,
	Router,
};
use serde::Serialize;
use solver_core::{Market, MarketStats};
use solver_types::{Address, BestBid, Bid, IntentId, SolverRecord, SwapIntent};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
struct AppState {
	market: Arc<Market>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
	error: &'static str,
	message: String,
}

enum ApiError {
	NotFound(String),
	BadRequest(String),
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let (status, error, message) = match self {
			ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "NOT_FOUND", message),
			ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
		};
		(status, Json(ErrorResponse { error, message })).into_response()
	}
}

pub fn router(market: Arc<Market>) -> Router {
	Router::new()
		.route("/health", get(health_check))
		.route("/api/stats", get(get_stats))
		.route("/api/intents/{id}", get(get_intent))
		.route("/api/intents/{id}/bids", get(get_bids))
		.route("/api/intents/{id}/best-bid", get(get_best_bid))
		.route("/api/solvers/{address}", get(get_solver))
		.with_state(AppState { market })
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
}

pub async fn serve(market: Arc<Market>, host: &str, port: u16) -> anyhow::Result<()> {
	let listener = tokio::net::TcpListener::bind(format!("{}:{}", host, port)).await?;
	info!(%host, port, "API server listening");
	axum::serve(listener, router(market)).await?;
	Ok(())
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
	Json(serde_json::json!({
		"status": "ok",
		"market": state.market.name(),
	}))
}

async fn get_stats(State(state): State<AppState>) -> Json<MarketStats> {
	Json(state.market.stats().await)
}

async fn get_intent(
	State(state): State<AppState>,
	Path(id): Path<IntentId>,
) -> Result<Json<SwapIntent>, ApiError> {
	state
		.market
		.intent(id)
		.await
		.map(Json)
		.ok_or_else(|| ApiError::NotFound(format!("intent {} not found", id)))
}

async fn get_bids(
	State(state): State<AppState>,
	Path(id): Path<IntentId>,
) -> Result<Json<Vec<Bid>>, ApiError> {
	if state.market.intent(id).await.is_none() {
		return Err(ApiError::NotFound(format!("intent {} not found", id)));
	}
	Ok(Json(state.market.bids(id).await))
}

async fn get_best_bid(
	State(state): State<AppState>,
	Path(id): Path<IntentId>,
) -> Result<Json<BestBid>, ApiError> {
	if state.market.intent(id).await.is_none() {
		return Err(ApiError::NotFound(format!("intent {} not found", id)));
	}
	Ok(Json(state.market.best_bid(id).await))
}

/// Solver record with decay applied up to now.
async fn get_solver(
	State(state): State<AppState>,
	Path(address): Path<String>,
) -> Result<Json<SolverRecord>, ApiError> {
	let address: Address = address
		.parse()
		.map_err(|e| ApiError::BadRequest(format!("invalid address: {}", e)))?;
	state
		.market
		.solver_stats(&address)
		.await
		.map(Json)
		.ok_or_else(|| ApiError::NotFound(format!("solver {} not found", address)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::{to_bytes, Body};
	use axum::http::Request;
	use solver_config::ConfigLoader;
	use solver_core::{MarketBuilder, NewBid};
	use solver_types::{keccak256, Clock, NewIntent, SystemClock};
	use tower::ServiceExt;

	const SOLVER: &str = "0x5151515151515151515151515151515151515151";
	const OWNER: &str = "0xa1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1a1";
	const TOKEN_IN: &str = "0x7171717171717171717171717171717171717171";
	const STAKE_TOKEN: &str = "0x5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a5a";

	fn config() -> String {
		format!(
			r#"
[market]
name = "api-test"
local_chain_id = 30101
local_address = "0x1010101010101010101010101010101010101010"
admin_address = "0xadadadadadadadadadadadadadadadadadadadad"
staking_token = "{stake}"

[custody]
custody_account = "0xcccccccccccccccccccccccccccccccccccccccc"
genesis = [
	{{ token = "{stake}", holder = "{solver}", amount = 1000 }},
	{{ token = "{token_in}", holder = "{owner}", amount = 1000 }},
]

[messaging]
endpoint_address = "0xe1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1e1"

[storage]
backend = "memory"
"#,
			stake = STAKE_TOKEN,
			solver = SOLVER,
			token_in = TOKEN_IN,
			owner = OWNER,
		)
	}

	async fn seeded_market() -> Arc<Market> {
		let config = ConfigLoader::new()
			.with_env_prefix("API_TEST_UNSET_")
			.load_from_str(&config())
			.unwrap();
		let (market, _admin) = MarketBuilder::new(config).build().unwrap();

		let solver: Address = SOLVER.parse().unwrap();
		market.stake(solver, 100).await.unwrap();
		let intent_id = market
			.create_intent(NewIntent {
				owner: OWNER.parse().unwrap(),
				token_in: TOKEN_IN.parse().unwrap(),
				token_out: TOKEN_IN.parse().unwrap(),
				amount_in: 500,
				min_amount_out: 400,
				destination_chain: 30110,
				deadline: SystemClock.now() + 3_600,
				commitment: keccak256(b"secret"),
			})
			.await
			.unwrap();
		market
			.place_bid(NewBid {
				solver,
				intent_id,
				amount_out: 450,
				gas_estimate: 21_000,
				execution_time: 30,
			})
			.await
			.unwrap();
		Arc::new(market)
	}

	async fn get(market: Arc<Market>, uri: &str) -> (StatusCode, serde_json::Value) {
		let response = router(market)
			.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
		let value = if bytes.is_empty() {
			serde_json::Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}

	#[tokio::test]
	async fn test_health_and_stats() {
		let market = seeded_market().await;

		let (status, body) = get(market.clone(), "/health").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["market"], "api-test");

		let (status, body) = get(market, "/api/stats").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["total_intents"], 1);
		assert_eq!(body["open_intents"], 1);
		assert_eq!(body["total_staked"], "100");
		assert_eq!(body["total_bids"], 1);
	}

	#[tokio::test]
	async fn test_intent_routes() {
		let market = seeded_market().await;

		let (status, body) = get(market.clone(), "/api/intents/1").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["owner"], OWNER);
		assert_eq!(body["status"], "Open");

		let (status, body) = get(market.clone(), "/api/intents/1/bids").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body.as_array().map(Vec::len), Some(1));

		let (status, body) = get(market.clone(), "/api/intents/1/best-bid").await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["Found"]["index"], 0);

		let (status, body) = get(market.clone(), "/api/intents/42").await;
		assert_eq!(status, StatusCode::NOT_FOUND);
		assert_eq!(body["error"], "NOT_FOUND");

		let (status, _) = get(market, "/api/intents/42/best-bid").await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn test_solver_route() {
		let market = seeded_market().await;

		let (status, body) = get(market.clone(), &format!("/api/solvers/{}", SOLVER)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["reputation"], 50);
		assert_eq!(body["active"], true);

		let (status, body) = get(market.clone(), "/api/solvers/0x1234").await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "BAD_REQUEST");

		let (status, _) = get(market, &format!("/api/solvers/{}", OWNER)).await;
		assert_eq!(status, StatusCode::NOT_FOUND);
	}
}
