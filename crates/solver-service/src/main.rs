use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use solver_config::{ConfigLoader, MarketConfig};
use solver_core::MarketBuilder;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;

#[derive(Parser)]
#[command(name = "oif-market")]
#[command(about = "OIF intent settlement market", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/market.toml")]
	config: PathBuf,

	/// Overrides `market.log_level` from the configuration
	#[arg(long, env = "MARKET_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the market service
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.with_context(|| format!("Failed to load configuration from {:?}", cli.config))?;

	let log_level = cli
		.log_level
		.clone()
		.unwrap_or_else(|| config.market.log_level.clone());
	setup_tracing(&log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_service(config).await,
		Some(Commands::Validate) => validate_config(&cli, &config),
	}
}

async fn start_service(config: MarketConfig) -> Result<()> {
	info!(name = %config.market.name, chain_id = config.market.local_chain_id, "starting market");

	let (market, _admin) = MarketBuilder::new(config.clone())
		.build()
		.context("Failed to build market")?;
	let market = Arc::new(market);

	if market
		.load_snapshot()
		.await
		.context("Failed to restore snapshot")?
	{
		let stats = market.stats().await;
		info!(
			intents = stats.total_intents,
			open = stats.open_intents,
			solvers = stats.active_solvers,
			"state restored from snapshot"
		);
	}

	let api_handle = if config.api.enabled {
		let market = market.clone();
		let host = config.api.host.clone();
		let port = config.api.port;
		Some(tokio::spawn(async move {
			if let Err(e) = api::serve(market, &host, port).await {
				error!(error = %e, "API server stopped");
			}
		}))
	} else {
		info!("API disabled");
		None
	};

	info!("market started");
	shutdown_signal().await;
	info!("shutdown signal received");

	if let Some(handle) = api_handle {
		handle.abort();
	}
	market
		.save_snapshot()
		.await
		.context("Failed to save snapshot")?;

	info!("market stopped");
	Ok(())
}

fn validate_config(cli: &Cli, config: &MarketConfig) -> Result<()> {
	info!(path = ?cli.config, "configuration is valid");
	info!(
		name = %config.market.name,
		chain_id = config.market.local_chain_id,
		min_stake = config.market.min_stake,
		max_message_fee = config.market.max_message_fee,
		"market"
	);
	for remote in &config.trusted_remotes {
		info!(chain_id = remote.chain_id, address = %remote.remote_address, "trusted remote");
	}
	for contract in &config.remote_contracts {
		info!(chain_id = contract.chain_id, address = %contract.address, "remote contract");
	}
	info!(count = config.authorized_solvers.len(), "authorized solvers");

	// Backends are only checked by building them
	MarketBuilder::new(config.clone())
		.build()
		.context("Configuration is valid but the market cannot be built")?;
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.or_else(|_| tracing_subscriber::EnvFilter::try_new(log_level))
		.with_context(|| format!("Invalid log level {:?}", log_level))?;

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = signal::ctrl_c().await {
			error!(error = %e, "failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match signal::unix::signal(signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			}
			Err(e) => {
				error!(error = %e, "failed to install SIGTERM handler");
				std::future::pending::<()>().await;
			}
		}
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
