//! The market engine.
//!
//! All stores live behind one async mutex. Each public call takes the lock,
//! reads the clock once, runs to completion (awaiting collaborators while
//! still holding the lock) and only then publishes the events it produced.
//! Calls are therefore totally ordered and a failed call publishes nothing.

use crate::admin::{AdminToken, MarketKey};
use crate::snapshot::{MarketSnapshot, SNAPSHOT_NAMESPACE};
use serde::{Deserialize, Serialize};
use solver_bids::{BidBook, NewBid};
use solver_custody::CustodyInterface;
use solver_gateway::{Completion, CrossChainGateway};
use solver_intents::{FulfillContext, Fulfillment, IntentLedger};
use solver_registry::SolverRegistry;
use solver_storage::StorageService;
use solver_types::serde_helpers::{deserialize_amount, serialize_amount};
use solver_types::{
	Address, AdminEvent, Amount, BestBid, Bid, ChainId, Clock, CrossChainMessage, EventBus,
	IntentId, IntentStatus, MarketError, MarketEvent, NewIntent, Result, SolverRecord,
	SwapIntent, TokenId,
};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub(crate) struct MarketState {
	pub(crate) registry: SolverRegistry,
	pub(crate) bids: BidBook,
	pub(crate) ledger: IntentLedger,
	pub(crate) gateway: CrossChainGateway,
}

/// Aggregate counters for dashboards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStats {
	pub name: String,
	pub local_chain_id: ChainId,
	pub total_intents: usize,
	pub open_intents: usize,
	pub fulfilled_intents: usize,
	pub expired_intents: usize,
	pub next_intent_id: IntentId,
	#[serde(
		serialize_with = "serialize_amount",
		deserialize_with = "deserialize_amount"
	)]
	pub total_staked: Amount,
	pub active_solvers: usize,
	pub total_bids: usize,
}

pub struct Market {
	name: String,
	local_chain_id: ChainId,
	admin_key: Arc<MarketKey>,
	snapshot_id: String,
	custody: Arc<dyn CustodyInterface>,
	state: Mutex<MarketState>,
	clock: Arc<dyn Clock>,
	storage: StorageService,
	event_bus: EventBus,
}

impl Market {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn new(
		name: String,
		local_chain_id: ChainId,
		admin_key: Arc<MarketKey>,
		snapshot_id: String,
		custody: Arc<dyn CustodyInterface>,
		state: MarketState,
		clock: Arc<dyn Clock>,
		storage: StorageService,
		event_bus: EventBus,
	) -> Self {
		Self {
			name,
			local_chain_id,
			admin_key,
			snapshot_id,
			custody,
			state: Mutex::new(state),
			clock,
			storage,
			event_bus,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn event_bus(&self) -> &EventBus {
		&self.event_bus
	}

	pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
		self.event_bus.subscribe()
	}

	fn authorize(&self, token: &AdminToken) -> Result<()> {
		if !token.governs(&self.admin_key) {
			return Err(MarketError::Unauthorized);
		}
		Ok(())
	}

	/// Publishes the buffered events of a committed call, or logs the
	/// rejection of a failed one.
	fn finish<T>(
		&self,
		operation: &'static str,
		result: Result<T>,
		events: Vec<MarketEvent>,
	) -> Result<T> {
		match result {
			Ok(value) => {
				self.event_bus.publish_all(events);
				Ok(value)
			}
			Err(error) => {
				warn!(operation, kind = ?error.kind(), %error, "operation rejected");
				Err(error)
			}
		}
	}

	// Solver registry

	pub async fn stake(&self, solver: Address, amount: Amount) -> Result<SolverRecord> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let result = state.registry.stake(solver, amount, now, &mut events).await;
		self.finish("stake", result, events)
	}

	pub async fn unstake(&self, solver: Address, amount: Amount) -> Result<SolverRecord> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let result = state
			.registry
			.unstake(solver, amount, now, &mut events)
			.await;
		self.finish("unstake", result, events)
	}

	/// Stored solver record, without pending decay.
	pub async fn solver(&self, solver: &Address) -> Option<SolverRecord> {
		self.state.lock().await.registry.solver(solver).cloned()
	}

	/// Solver record with decay up to now applied to the returned copy only.
	pub async fn solver_stats(&self, solver: &Address) -> Option<SolverRecord> {
		let state = self.state.lock().await;
		state.registry.solver_stats(solver, self.clock.now())
	}

	pub async fn active_solvers(&self) -> Vec<Address> {
		self.state.lock().await.registry.active_solvers()
	}

	pub async fn total_staked(&self) -> Amount {
		self.state.lock().await.registry.total_staked()
	}

	pub async fn is_eligible(&self, solver: &Address) -> bool {
		let state = self.state.lock().await;
		state.registry.is_eligible(solver, self.clock.now())
	}

	// Bid book

	pub async fn place_bid(&self, bid: NewBid) -> Result<usize> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let open = state.ledger.ensure_live(bid.intent_id, now).map(|_| ());
		let result = open.and_then(|()| {
			let MarketState { registry, bids, .. } = &mut *state;
			bids.place_bid(registry, bid, now, &mut events)
		});
		self.finish("place_bid", result, events)
	}

	/// Accepts a bid slot on behalf of the privileged matcher.
	pub async fn accept_bid(
		&self,
		token: &AdminToken,
		intent_id: IntentId,
		index: usize,
	) -> Result<Bid> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = match self.authorize(token) {
			Ok(()) => state.bids.accept_bid(intent_id, index, &mut events),
			Err(e) => Err(e),
		};
		self.finish("accept_bid", result, events)
	}

	pub async fn best_bid(&self, intent_id: IntentId) -> BestBid {
		let state = self.state.lock().await;
		state
			.bids
			.best_bid(&state.registry, intent_id, self.clock.now())
	}

	pub async fn bids(&self, intent_id: IntentId) -> Vec<Bid> {
		self.state.lock().await.bids.bids(intent_id)
	}

	// Intent ledger

	pub async fn create_intent(&self, request: NewIntent) -> Result<IntentId> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let result = state.ledger.create_intent(request, now, &mut events).await;
		self.finish("create_intent", result, events)
	}

	pub async fn fulfill(&self, request: Fulfillment) -> Result<SwapIntent> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let MarketState {
			registry,
			bids,
			ledger,
			gateway,
		} = &mut *state;
		let ctx = FulfillContext {
			registry,
			bids: &*bids,
			gateway: &*gateway,
		};
		let result = ledger.fulfill(ctx, request, now, &mut events).await;
		self.finish("fulfill", result, events)
	}

	pub async fn expire(&self, intent_id: IntentId) -> Result<SwapIntent> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let result = state.ledger.expire(intent_id, now, &mut events).await;
		self.finish("expire", result, events)
	}

	pub async fn intent(&self, intent_id: IntentId) -> Option<SwapIntent> {
		self.state.lock().await.ledger.intent(intent_id).cloned()
	}

	pub async fn intents_by_owner(&self, owner: &Address) -> Vec<SwapIntent> {
		self.state.lock().await.ledger.intents_by_owner(owner)
	}

	pub async fn next_intent_id(&self) -> IntentId {
		self.state.lock().await.ledger.next_intent_id()
	}

	pub async fn is_authorized_solver(&self, solver: &Address) -> bool {
		self.state.lock().await.ledger.is_authorized_solver(solver)
	}

	// Gateway

	/// Inbound confirmation delivered by the messaging endpoint.
	pub async fn receive(
		&self,
		caller: Address,
		source_chain: ChainId,
		source_path: &[u8],
		payload: &[u8],
	) -> Result<CrossChainMessage> {
		let mut state = self.state.lock().await;
		let now = self.clock.now();
		let mut events = Vec::new();
		let MarketState {
			ledger, gateway, ..
		} = &mut *state;
		let result = gateway.receive(
			&caller,
			source_chain,
			source_path,
			payload,
			|intent_id| ledger.intent(intent_id).map(|intent| intent.owner),
			now,
			&mut events,
		);
		self.finish("receive", result, events)
	}

	pub async fn is_trusted_remote(&self, chain_id: ChainId, path: &[u8]) -> bool {
		self.state
			.lock()
			.await
			.gateway
			.is_trusted_remote(chain_id, path)
	}

	pub async fn remote_contract(&self, chain_id: ChainId) -> Option<Address> {
		self.state.lock().await.gateway.remote_contract(chain_id)
	}

	pub async fn completion(&self, intent_id: IntentId) -> Option<Completion> {
		self.state
			.lock()
			.await
			.gateway
			.completion(intent_id)
			.cloned()
	}

	// Administration

	pub async fn set_trusted_remote(
		&self,
		token: &AdminToken,
		chain_id: ChainId,
		path: Vec<u8>,
	) -> Result<()> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = self
			.authorize(token)
			.map(|()| state.gateway.set_trusted_remote(chain_id, path, &mut events));
		self.finish("set_trusted_remote", result, events)
	}

	pub async fn set_remote_contract(
		&self,
		token: &AdminToken,
		chain_id: ChainId,
		address: Address,
	) -> Result<()> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = self
			.authorize(token)
			.map(|()| state.gateway.set_remote_contract(chain_id, address, &mut events));
		self.finish("set_remote_contract", result, events)
	}

	pub async fn authorize_solver(
		&self,
		token: &AdminToken,
		solver: Address,
		authorized: bool,
	) -> Result<()> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = self
			.authorize(token)
			.map(|()| state.ledger.authorize_solver(solver, authorized, &mut events));
		self.finish("authorize_solver", result, events)
	}

	pub async fn update_staking_parameters(
		&self,
		token: &AdminToken,
		min_stake: Amount,
	) -> Result<()> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = self.authorize(token).map(|()| {
			state.registry.update_min_stake(min_stake);
			events.push(MarketEvent::Admin(AdminEvent::StakingParametersUpdated {
				min_stake,
			}));
		});
		self.finish("update_staking_parameters", result, events)
	}

	pub async fn emergency_withdraw(
		&self,
		token: &AdminToken,
		asset: TokenId,
		amount: Amount,
	) -> Result<()> {
		let mut state = self.state.lock().await;
		let mut events = Vec::new();
		let result = match self.authorize(token) {
			Ok(()) => {
				state
					.ledger
					.emergency_withdraw(asset, amount, &mut events)
					.await
			}
			Err(e) => Err(e),
		};
		self.finish("emergency_withdraw", result, events)
	}

	// Reporting and persistence

	pub async fn stats(&self) -> MarketStats {
		let state = self.state.lock().await;
		MarketStats {
			name: self.name.clone(),
			local_chain_id: self.local_chain_id,
			total_intents: state.ledger.intent_count(),
			open_intents: state.ledger.count_by_status(IntentStatus::Open),
			fulfilled_intents: state.ledger.count_by_status(IntentStatus::Fulfilled),
			expired_intents: state.ledger.count_by_status(IntentStatus::Expired),
			next_intent_id: state.ledger.next_intent_id(),
			total_staked: state.registry.total_staked(),
			active_solvers: state.registry.active_solvers().len(),
			total_bids: state.bids.bid_count(),
		}
	}

	pub async fn snapshot(&self) -> MarketSnapshot {
		let state = self.state.lock().await;
		self.capture(&state)
	}

	fn capture(&self, state: &MarketState) -> MarketSnapshot {
		MarketSnapshot {
			saved_at: self.clock.now(),
			registry: state.registry.snapshot(),
			bids: state.bids.snapshot(),
			ledger: state.ledger.snapshot(),
			gateway: state.gateway.snapshot(),
			custody: self.custody.export_balances(),
		}
	}

	/// Writes the full market state to storage, together with the custody
	/// balances when the backend does not keep them itself.
	pub async fn save_snapshot(&self) -> Result<()> {
		let state = self.state.lock().await;
		let snapshot = self.capture(&state);
		self.storage
			.store(SNAPSHOT_NAMESPACE, &self.snapshot_id, &snapshot)
			.await?;
		info!(
			snapshot_id = %self.snapshot_id,
			intents = state.ledger.intent_count(),
			"snapshot saved"
		);
		Ok(())
	}

	/// Replaces the market state with the stored snapshot, if one exists.
	///
	/// Returns whether a snapshot was found.
	pub async fn load_snapshot(&self) -> Result<bool> {
		let mut state = self.state.lock().await;
		let snapshot: Option<MarketSnapshot> = self
			.storage
			.try_retrieve(SNAPSHOT_NAMESPACE, &self.snapshot_id)
			.await?;
		let Some(snapshot) = snapshot else {
			info!(snapshot_id = %self.snapshot_id, "no snapshot found");
			return Ok(false);
		};

		// Funds backing the restored intents and stakes come back first
		if let Some(balances) = snapshot.custody {
			self.custody.restore_balances(balances)?;
		}

		state.registry.restore(snapshot.registry);
		state.bids.restore(snapshot.bids);
		state.ledger.restore(snapshot.ledger);
		state.gateway.restore(snapshot.gateway);
		info!(
			snapshot_id = %self.snapshot_id,
			saved_at = snapshot.saved_at,
			intents = state.ledger.intent_count(),
			"snapshot restored"
		);
		Ok(true)
	}
}
