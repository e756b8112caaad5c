//! Intent records and their lifecycle.
//!
//! Every mutating call validates all preconditions first, then performs its
//! custody and endpoint calls, and only then touches the in-memory records.
//! A failed call therefore leaves the ledger exactly as it found it.

use crate::performance::PerformanceTracker;
use serde::{Deserialize, Serialize};
use solver_bids::BidBook;
use solver_custody::CustodyInterface;
use solver_gateway::CrossChainGateway;
use solver_registry::SolverRegistry;
use solver_types::{
	Address, AdminEvent, Amount, ChainId, IntentEvent, IntentId, IntentStatus, MarketError,
	MarketEvent, NewIntent, Result, SwapIntent, Timestamp, TokenId, MAX_INTENT_LIFETIME,
};
use solver_verifier::VerifierInterface;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerParams {
	pub local_chain_id: ChainId,
	/// Receives emergency withdrawals.
	pub admin_address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
	pub intents: BTreeMap<IntentId, SwapIntent>,
	pub next_intent_id: IntentId,
	pub authorized_solvers: BTreeSet<Address>,
}

impl Default for LedgerState {
	fn default() -> Self {
		Self {
			intents: BTreeMap::new(),
			next_intent_id: 1,
			authorized_solvers: BTreeSet::new(),
		}
	}
}

/// A solver's claim that it delivered an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fulfillment {
	pub intent_id: IntentId,
	pub solver: Address,
	pub amount_out: Amount,
	pub proof: Vec<u8>,
}

/// Stores borrowed by `fulfill` besides the ledger itself.
pub struct FulfillContext<'a> {
	pub registry: &'a mut SolverRegistry,
	pub bids: &'a BidBook,
	pub gateway: &'a CrossChainGateway,
}

pub struct IntentLedger {
	params: LedgerParams,
	state: LedgerState,
	custody: Arc<dyn CustodyInterface>,
	verifier: Arc<dyn VerifierInterface>,
}

impl IntentLedger {
	pub fn new(
		params: LedgerParams,
		custody: Arc<dyn CustodyInterface>,
		verifier: Arc<dyn VerifierInterface>,
	) -> Self {
		Self {
			params,
			state: LedgerState::default(),
			custody,
			verifier,
		}
	}

	pub fn snapshot(&self) -> LedgerState {
		self.state.clone()
	}

	pub fn restore(&mut self, state: LedgerState) {
		self.state = state;
	}

	pub fn intent(&self, intent_id: IntentId) -> Option<&SwapIntent> {
		self.state.intents.get(&intent_id)
	}

	/// Intents created by `owner`, oldest first.
	pub fn intents_by_owner(&self, owner: &Address) -> Vec<SwapIntent> {
		self.state
			.intents
			.values()
			.filter(|intent| intent.owner == *owner)
			.cloned()
			.collect()
	}

	pub fn next_intent_id(&self) -> IntentId {
		self.state.next_intent_id
	}

	pub fn intent_count(&self) -> usize {
		self.state.intents.len()
	}

	pub fn count_by_status(&self, status: IntentStatus) -> usize {
		self.state
			.intents
			.values()
			.filter(|intent| intent.status == status)
			.count()
	}

	pub fn is_authorized_solver(&self, solver: &Address) -> bool {
		self.state.authorized_solvers.contains(solver)
	}

	pub fn authorize_solver(
		&mut self,
		solver: Address,
		authorized: bool,
		events: &mut Vec<MarketEvent>,
	) {
		if authorized {
			self.state.authorized_solvers.insert(solver);
		} else {
			self.state.authorized_solvers.remove(&solver);
		}
		events.push(MarketEvent::Admin(AdminEvent::SolverAuthorized { solver, authorized }));
		info!(%solver, authorized, "solver authorization changed");
	}

	/// Records a new intent and locks `amount_in` from the owner.
	pub async fn create_intent(
		&mut self,
		request: NewIntent,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<IntentId> {
		if request.amount_in == 0 || request.min_amount_out == 0 {
			return Err(MarketError::InvalidAmount);
		}
		let latest = now.saturating_add(MAX_INTENT_LIFETIME);
		if request.deadline <= now || request.deadline > latest {
			return Err(MarketError::InvalidDeadline {
				deadline: request.deadline,
				now,
			});
		}
		if request.destination_chain == self.params.local_chain_id {
			return Err(MarketError::SameChain(request.destination_chain));
		}
		let intent_id = self.state.next_intent_id;
		let next_id = intent_id
			.checked_add(1)
			.ok_or(MarketError::InvalidAmount)?;

		self.custody
			.transfer_from(&request.token_in, &request.owner, request.amount_in)
			.await?;

		self.state.next_intent_id = next_id;
		self.state.intents.insert(
			intent_id,
			SwapIntent {
				id: intent_id,
				owner: request.owner,
				token_in: request.token_in,
				token_out: request.token_out,
				amount_in: request.amount_in,
				min_amount_out: request.min_amount_out,
				destination_chain: request.destination_chain,
				created_at: now,
				deadline: request.deadline,
				status: IntentStatus::Open,
				commitment: request.commitment,
				solver: None,
			},
		);

		events.push(MarketEvent::Intent(IntentEvent::SwapIntentCreated {
			intent_id,
			owner: request.owner,
			amount_in: request.amount_in,
			destination_chain: request.destination_chain,
		}));
		info!(
			intent_id,
			owner = %request.owner,
			amount_in = request.amount_in,
			destination_chain = request.destination_chain,
			deadline = request.deadline,
			"swap intent created"
		);

		Ok(intent_id)
	}

	/// Fails unless the intent exists and is still open.
	pub fn ensure_open(&self, intent_id: IntentId) -> Result<&SwapIntent> {
		let intent = self
			.intent(intent_id)
			.ok_or(MarketError::UnknownIntent(intent_id))?;
		match intent.status {
			IntentStatus::Open => Ok(intent),
			IntentStatus::Fulfilled => Err(MarketError::AlreadyFulfilled(intent_id)),
			IntentStatus::Expired => Err(MarketError::Expired(intent_id)),
		}
	}

	/// Fails unless the intent is open and its deadline has not passed at `now`.
	pub fn ensure_live(&self, intent_id: IntentId, now: Timestamp) -> Result<&SwapIntent> {
		let intent = self.ensure_open(intent_id)?;
		if now > intent.deadline {
			return Err(MarketError::DeadlinePassed {
				intent_id,
				deadline: intent.deadline,
			});
		}
		Ok(intent)
	}

	/// Solver must be allowlisted, active in the registry, and hold an
	/// accepted bid once any bid on the intent has been accepted.
	fn ensure_solver_authorized(
		&self,
		ctx: &FulfillContext<'_>,
		intent_id: IntentId,
		solver: &Address,
	) -> Result<()> {
		if !self.is_authorized_solver(solver) {
			return Err(MarketError::UnauthorizedSolver(*solver));
		}
		if !ctx.registry.solver(solver).is_some_and(|record| record.active) {
			return Err(MarketError::UnauthorizedSolver(*solver));
		}
		if ctx.bids.has_accepted_bid(intent_id) && !ctx.bids.is_accepted_solver(intent_id, solver)
		{
			return Err(MarketError::UnauthorizedSolver(*solver));
		}
		Ok(())
	}

	/// Settles an open intent: pays `amount_out` of the output token to the
	/// owner, credits the solver's reputation and sends the cross-chain
	/// confirmation.
	pub async fn fulfill(
		&mut self,
		ctx: FulfillContext<'_>,
		request: Fulfillment,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SwapIntent> {
		let intent_id = request.intent_id;
		let solver = request.solver;

		if self.intent(intent_id).is_none() {
			return Err(MarketError::UnknownIntent(intent_id));
		}
		self.ensure_solver_authorized(&ctx, intent_id, &solver)?;
		let intent = self.ensure_live(intent_id, now)?.clone();
		if request.amount_out < intent.min_amount_out {
			return Err(MarketError::InsufficientOutput {
				offered: request.amount_out,
				minimum: intent.min_amount_out,
			});
		}
		if !self
			.verifier
			.verify(&request.proof, &intent.commitment)
			.await?
		{
			return Err(MarketError::InvalidProof(intent_id));
		}

		let prepared = ctx
			.gateway
			.prepare_dispatch(
				intent_id,
				intent.owner,
				intent.token_out,
				request.amount_out,
				intent.destination_chain,
			)
			.await?;

		self.custody
			.transfer(&intent.token_out, &intent.owner, request.amount_out)
			.await?;

		let mut dispatch_events = Vec::new();
		if let Err(send_error) = ctx.gateway.send(prepared, &mut dispatch_events).await {
			warn!(intent_id, error = %send_error, "confirmation send failed, reverting payout");
			return Err(self
				.revert_payout(&intent, request.amount_out, send_error)
				.await);
		}

		let execution_time = now.saturating_sub(intent.created_at);
		let fulfilled = {
			let record = self
				.state
				.intents
				.get_mut(&intent_id)
				.ok_or(MarketError::UnknownIntent(intent_id))?;
			record.status = IntentStatus::Fulfilled;
			record.solver = Some(solver);
			record.clone()
		};
		events.push(MarketEvent::Intent(IntentEvent::SwapIntentFulfilled {
			intent_id,
			solver,
			amount_out: request.amount_out,
		}));
		PerformanceTracker::record(
			ctx.registry,
			&solver,
			intent_id,
			true,
			execution_time,
			request.amount_out,
			now,
			events,
		)?;
		events.append(&mut dispatch_events);

		info!(
			intent_id,
			%solver,
			amount_out = request.amount_out,
			execution_time,
			"swap intent fulfilled"
		);
		Ok(fulfilled)
	}

	/// Pulls a payout back from the owner after a failed confirmation send.
	async fn revert_payout(
		&self,
		intent: &SwapIntent,
		amount_out: Amount,
		cause: MarketError,
	) -> MarketError {
		match self
			.custody
			.transfer_from(&intent.token_out, &intent.owner, amount_out)
			.await
		{
			Ok(()) => cause,
			Err(custody_error) => {
				error!(
					intent_id = intent.id,
					owner = %intent.owner,
					amount_out,
					error = %custody_error,
					cause = %cause,
					"failed to revert payout after confirmation send failure"
				);
				MarketError::Custody(format!(
					"payout of intent {} not reverted after send failure ({}): {}",
					intent.id, cause, custody_error
				))
			}
		}
	}

	/// Closes an open intent past its deadline and refunds the owner.
	pub async fn expire(
		&mut self,
		intent_id: IntentId,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SwapIntent> {
		let intent = self.ensure_open(intent_id)?.clone();
		if now <= intent.deadline {
			return Err(MarketError::NotExpired {
				intent_id,
				deadline: intent.deadline,
			});
		}

		self.custody
			.transfer(&intent.token_in, &intent.owner, intent.amount_in)
			.await?;

		let expired = {
			let record = self
				.state
				.intents
				.get_mut(&intent_id)
				.ok_or(MarketError::UnknownIntent(intent_id))?;
			record.status = IntentStatus::Expired;
			record.clone()
		};
		events.push(MarketEvent::Intent(IntentEvent::SwapIntentExpired {
			intent_id,
			refunded: intent.amount_in,
		}));
		info!(intent_id, owner = %intent.owner, refunded = intent.amount_in, "swap intent expired");

		Ok(expired)
	}

	/// Pays `amount` of `token` from custody to the administrator.
	pub async fn emergency_withdraw(
		&mut self,
		token: TokenId,
		amount: Amount,
		events: &mut Vec<MarketEvent>,
	) -> Result<()> {
		if amount == 0 {
			return Err(MarketError::InvalidAmount);
		}
		self.custody
			.transfer(&token, &self.params.admin_address, amount)
			.await?;
		events.push(MarketEvent::Admin(AdminEvent::EmergencyWithdrawal { token, amount }));
		warn!(%token, amount, to = %self.params.admin_address, "emergency withdrawal");
		Ok(())
	}
}
