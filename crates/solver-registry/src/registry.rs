//! Stake and reputation bookkeeping.

use crate::reputation::{self, VolumeThresholds};
use serde::{Deserialize, Serialize};
use solver_custody::CustodyInterface;
use solver_types::{
	Address, Amount, MarketError, MarketEvent, RegistryEvent, Result, SolverRecord, Timestamp,
	TokenId, MIN_REPUTATION,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Static registry settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryParams {
	/// Token solvers stake in.
	pub staking_token: TokenId,
	/// Smallest total stake a solver may hold after staking.
	pub min_stake: Amount,
	pub volume_thresholds: VolumeThresholds,
}

/// Serializable registry contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
	pub solvers: HashMap<Address, SolverRecord>,
	pub total_staked: Amount,
	/// Overrides `RegistryParams::min_stake` once set by an administrator.
	pub min_stake: Option<Amount>,
}

pub struct SolverRegistry {
	params: RegistryParams,
	state: RegistryState,
	custody: Arc<dyn CustodyInterface>,
}

impl SolverRegistry {
	pub fn new(params: RegistryParams, custody: Arc<dyn CustodyInterface>) -> Self {
		Self {
			params,
			state: RegistryState::default(),
			custody,
		}
	}

	pub fn snapshot(&self) -> RegistryState {
		self.state.clone()
	}

	pub fn restore(&mut self, state: RegistryState) {
		self.state = state;
	}

	pub fn params(&self) -> &RegistryParams {
		&self.params
	}

	pub fn min_stake(&self) -> Amount {
		self.state.min_stake.unwrap_or(self.params.min_stake)
	}

	pub fn total_staked(&self) -> Amount {
		self.state.total_staked
	}

	/// Raw stored record, without pending decay.
	pub fn solver(&self, solver: &Address) -> Option<&SolverRecord> {
		self.state.solvers.get(solver)
	}

	/// Record as it would look after applying pending decay at `now`.
	/// Does not modify the stored record.
	pub fn solver_stats(&self, solver: &Address, now: Timestamp) -> Option<SolverRecord> {
		self.state.solvers.get(solver).map(|record| {
			let mut view = record.clone();
			let periods = reputation::elapsed_periods(view.last_reputation_update, now);
			if periods > 0 {
				view.reputation = reputation::decay(view.reputation, periods);
				view.last_reputation_update = now;
			}
			view
		})
	}

	/// Active solvers, sorted by address.
	pub fn active_solvers(&self) -> Vec<Address> {
		let mut active: Vec<Address> = self
			.state
			.solvers
			.values()
			.filter(|record| record.active)
			.map(|record| record.address)
			.collect();
		active.sort();
		active
	}

	/// Checks that `solver` may bid: active and at least minimum reputation
	/// once pending decay is accounted for.
	pub fn ensure_eligible(&self, solver: &Address, now: Timestamp) -> Result<()> {
		let view = self
			.solver_stats(solver, now)
			.ok_or(MarketError::InactiveSolver(*solver))?;
		if !view.active {
			return Err(MarketError::InactiveSolver(*solver));
		}
		if view.reputation < MIN_REPUTATION {
			return Err(MarketError::InsufficientReputation {
				solver: *solver,
				reputation: view.reputation,
			});
		}
		Ok(())
	}

	pub fn is_eligible(&self, solver: &Address, now: Timestamp) -> bool {
		self.ensure_eligible(solver, now).is_ok()
	}

	/// Administrative update of the minimum stake.
	pub fn update_min_stake(&mut self, min_stake: Amount) {
		self.state.min_stake = Some(min_stake);
		info!(min_stake, "staking parameters updated");
	}

	/// Locks `amount` of the staking token for `solver`.
	///
	/// Creates the record on first stake; re-activates an unstaked solver
	/// with baseline reputation and its swap history intact.
	pub async fn stake(
		&mut self,
		solver: Address,
		amount: Amount,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SolverRecord> {
		if amount == 0 {
			return Err(MarketError::InvalidAmount);
		}

		let current = self
			.state
			.solvers
			.get(&solver)
			.map(|record| record.stake)
			.unwrap_or(0);
		let new_stake = current
			.checked_add(amount)
			.ok_or(MarketError::InvalidAmount)?;
		let new_total = self
			.state
			.total_staked
			.checked_add(amount)
			.ok_or(MarketError::InvalidAmount)?;
		let min_stake = self.min_stake();
		if new_stake < min_stake {
			return Err(MarketError::InsufficientStake {
				required: min_stake,
				available: new_stake,
			});
		}

		self.custody
			.transfer_from(&self.params.staking_token, &solver, amount)
			.await?;

		let existing = self.state.solvers.contains_key(&solver);
		let record = self
			.state
			.solvers
			.entry(solver)
			.or_insert_with(|| SolverRecord::new(solver, new_stake, now));
		if existing {
			if record.active {
				apply_decay(record, now, events);
			} else {
				record.active = true;
				record.reputation = MIN_REPUTATION;
				record.last_reputation_update = now;
				events.push(MarketEvent::Registry(RegistryEvent::ReputationUpdated {
					solver,
					new_reputation: MIN_REPUTATION,
					delta: MIN_REPUTATION as i64,
				}));
			}
			record.stake = new_stake;
		}
		let snapshot = record.clone();
		self.state.total_staked = new_total;

		events.push(MarketEvent::Registry(RegistryEvent::SolverStaked {
			solver,
			amount,
			total_stake: new_stake,
		}));
		info!(%solver, amount, stake = new_stake, "solver staked");

		Ok(snapshot)
	}

	/// Returns `amount` of stake to `solver`. A full unstake deactivates the
	/// solver and discards its reputation.
	pub async fn unstake(
		&mut self,
		solver: Address,
		amount: Amount,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SolverRecord> {
		if amount == 0 {
			return Err(MarketError::InvalidAmount);
		}

		let current = self
			.state
			.solvers
			.get(&solver)
			.map(|record| record.stake)
			.unwrap_or(0);
		if amount > current {
			return Err(MarketError::InsufficientStake {
				required: amount,
				available: current,
			});
		}

		self.custody
			.transfer(&self.params.staking_token, &solver, amount)
			.await?;

		let record = self
			.state
			.solvers
			.get_mut(&solver)
			.ok_or(MarketError::UnknownSolver(solver))?;
		apply_decay(record, now, events);
		record.stake = current - amount;
		if record.stake == 0 {
			let previous = record.reputation;
			record.active = false;
			record.reputation = 0;
			record.last_reputation_update = now;
			events.push(MarketEvent::Registry(RegistryEvent::ReputationUpdated {
				solver,
				new_reputation: 0,
				delta: -(previous as i64),
			}));
		}
		let snapshot = record.clone();
		self.state.total_staked -= amount;

		events.push(MarketEvent::Registry(RegistryEvent::SolverUnstaked {
			solver,
			amount,
			remaining_stake: snapshot.stake,
		}));
		info!(
			%solver,
			amount,
			remaining = snapshot.stake,
			active = snapshot.active,
			"solver unstaked"
		);

		Ok(snapshot)
	}

	/// Folds one swap outcome into the solver's history and reputation.
	pub fn apply_reputation_delta(
		&mut self,
		solver: &Address,
		success: bool,
		execution_time: u64,
		volume: Amount,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SolverRecord> {
		let thresholds = self.params.volume_thresholds;
		let record = self
			.state
			.solvers
			.get_mut(solver)
			.ok_or(MarketError::UnknownSolver(*solver))?;

		let before = record.reputation;
		let periods = reputation::elapsed_periods(record.last_reputation_update, now);
		let decayed = reputation::decay(before, periods);

		record.total_swaps += 1;
		record.total_volume = record.total_volume.saturating_add(volume);

		record.reputation = if success {
			record.successful_swaps += 1;
			record.avg_execution_time = reputation::rolling_average(
				record.avg_execution_time,
				record.successful_swaps,
				execution_time,
			);
			reputation::reward(decayed, execution_time, volume, &thresholds)
		} else {
			reputation::penalize(decayed)
		};
		record.last_reputation_update = now;

		let delta = record.reputation as i64 - before as i64;
		events.push(MarketEvent::Registry(RegistryEvent::ReputationUpdated {
			solver: *solver,
			new_reputation: record.reputation,
			delta,
		}));
		debug!(
			%solver,
			success,
			execution_time,
			reputation = record.reputation,
			delta,
			"reputation updated"
		);

		Ok(record.clone())
	}
}

/// Applies decay accrued since the last update. A touch inside the current
/// period leaves the record untouched.
fn apply_decay(record: &mut SolverRecord, now: Timestamp, events: &mut Vec<MarketEvent>) {
	let periods = reputation::elapsed_periods(record.last_reputation_update, now);
	if periods == 0 {
		return;
	}
	let before = record.reputation;
	record.reputation = reputation::decay(before, periods);
	record.last_reputation_update = now;
	debug!(solver = %record.address, periods, before, after = record.reputation, "decay applied");
	if record.reputation != before {
		events.push(MarketEvent::Registry(RegistryEvent::ReputationUpdated {
			solver: record.address,
			new_reputation: record.reputation,
			delta: record.reputation as i64 - before as i64,
		}));
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use solver_custody::implementations::memory::MemoryLedger;
	use solver_types::{DECAY_PERIOD, MAX_REPUTATION};

	const T0: Timestamp = 1_700_000_000;

	fn token() -> TokenId {
		Address::repeat_byte(0x5a)
	}

	fn solver() -> Address {
		Address::repeat_byte(0x51)
	}

	fn setup() -> (SolverRegistry, Arc<MemoryLedger>) {
		let ledger = Arc::new(MemoryLedger::new(Address::repeat_byte(0xcc)));
		ledger.mint(token(), solver(), 1_000_000);
		let params = RegistryParams {
			staking_token: token(),
			min_stake: 1,
			volume_thresholds: VolumeThresholds {
				large: 10_000,
				medium: 1_000,
			},
		};
		(SolverRegistry::new(params, ledger.clone()), ledger)
	}

	#[tokio::test]
	async fn test_first_stake_creates_baseline_record() {
		let (mut registry, ledger) = setup();
		let mut events = Vec::new();

		let record = registry.stake(solver(), 500, T0, &mut events).await.unwrap();
		assert_eq!(record.stake, 500);
		assert_eq!(record.reputation, MIN_REPUTATION);
		assert!(record.active);
		assert_eq!(registry.total_staked(), 500);
		assert_eq!(ledger.balance(&token(), &solver()), 999_500);
		assert_eq!(
			events,
			vec![MarketEvent::Registry(RegistryEvent::SolverStaked {
				solver: solver(),
				amount: 500,
				total_stake: 500
			})]
		);
	}

	#[tokio::test]
	async fn test_stake_zero_rejected() {
		let (mut registry, _) = setup();
		let err = registry
			.stake(solver(), 0, T0, &mut Vec::new())
			.await
			.unwrap_err();
		assert_eq!(err, MarketError::InvalidAmount);
	}

	#[tokio::test]
	async fn test_stake_below_minimum_rejected_without_transfer() {
		let (mut registry, ledger) = setup();
		registry.update_min_stake(1000);
		let err = registry
			.stake(solver(), 999, T0, &mut Vec::new())
			.await
			.unwrap_err();
		assert_eq!(
			err,
			MarketError::InsufficientStake {
				required: 1000,
				available: 999
			}
		);
		assert_eq!(ledger.balance(&token(), &solver()), 1_000_000);
		assert!(registry.solver(&solver()).is_none());
	}

	#[tokio::test]
	async fn test_custody_failure_leaves_registry_untouched() {
		let (mut registry, ledger) = setup();
		ledger.freeze(solver());
		let err = registry
			.stake(solver(), 10, T0, &mut Vec::new())
			.await
			.unwrap_err();
		assert!(matches!(err, MarketError::Custody(_)));
		assert!(registry.solver(&solver()).is_none());
		assert_eq!(registry.total_staked(), 0);
	}

	#[tokio::test]
	async fn test_full_unstake_deactivates_and_discards_reputation() {
		let (mut registry, ledger) = setup();
		registry.stake(solver(), 700, T0, &mut Vec::new()).await.unwrap();
		registry
			.apply_reputation_delta(&solver(), true, 10, 50, T0 + 1, &mut Vec::new())
			.unwrap();

		let record = registry
			.unstake(solver(), 700, T0 + 2, &mut Vec::new())
			.await
			.unwrap();
		assert!(!record.active);
		assert_eq!(record.stake, 0);
		assert_eq!(record.reputation, 0);
		assert_eq!(record.total_swaps, 1);
		assert_eq!(record.successful_swaps, 1);
		assert_eq!(registry.total_staked(), 0);
		assert_eq!(ledger.balance(&token(), &solver()), 1_000_000);
		assert!(registry.active_solvers().is_empty());
	}

	#[tokio::test]
	async fn test_unstake_more_than_stake_rejected() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();
		let err = registry
			.unstake(solver(), 101, T0, &mut Vec::new())
			.await
			.unwrap_err();
		assert_eq!(
			err,
			MarketError::InsufficientStake {
				required: 101,
				available: 100
			}
		);

		let err = registry
			.unstake(Address::repeat_byte(0x99), 1, T0, &mut Vec::new())
			.await
			.unwrap_err();
		assert_eq!(
			err,
			MarketError::InsufficientStake {
				required: 1,
				available: 0
			}
		);
	}

	#[tokio::test]
	async fn test_restake_resets_reputation_keeps_history() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();
		for _ in 0..5 {
			registry
				.apply_reputation_delta(&solver(), true, 10, 50_000, T0 + 10, &mut Vec::new())
				.unwrap();
		}
		assert_eq!(registry.solver(&solver()).unwrap().reputation, 50 + 5 * 15);

		registry.unstake(solver(), 100, T0 + 20, &mut Vec::new()).await.unwrap();
		let record = registry
			.stake(solver(), 40, T0 + 30, &mut Vec::new())
			.await
			.unwrap();
		assert!(record.active);
		assert_eq!(record.reputation, MIN_REPUTATION);
		assert_eq!(record.total_swaps, 5);
		assert_eq!(record.stake, 40);
	}

	#[tokio::test]
	async fn test_stake_applies_pending_decay() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();
		for _ in 0..10 {
			registry
				.apply_reputation_delta(&solver(), true, 10, 0, T0, &mut Vec::new())
				.unwrap();
		}
		// 50 + 10 * 11
		assert_eq!(registry.solver(&solver()).unwrap().reputation, 160);

		let mut events = Vec::new();
		let record = registry
			.stake(solver(), 1, T0 + 2 * DECAY_PERIOD, &mut events)
			.await
			.unwrap();
		// floor(160 * 5 * 2 / 100) = 16
		assert_eq!(record.reputation, 144);
		assert_eq!(record.last_reputation_update, T0 + 2 * DECAY_PERIOD);
		assert!(events.contains(&MarketEvent::Registry(RegistryEvent::ReputationUpdated {
			solver: solver(),
			new_reputation: 144,
			delta: -16
		})));
	}

	#[tokio::test]
	async fn test_decay_idempotent_within_period() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();
		registry
			.stake(solver(), 1, T0 + DECAY_PERIOD, &mut Vec::new())
			.await
			.unwrap();
		let first = registry.solver(&solver()).unwrap().clone();

		// Another touch inside the same period changes nothing but the stake
		registry
			.stake(solver(), 1, T0 + DECAY_PERIOD + 100, &mut Vec::new())
			.await
			.unwrap();
		let second = registry.solver(&solver()).unwrap().clone();
		assert_eq!(first.reputation, second.reputation);
		assert_eq!(first.last_reputation_update, second.last_reputation_update);
	}

	#[tokio::test]
	async fn test_stats_view_does_not_mutate() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();

		let view = registry
			.solver_stats(&solver(), T0 + 3 * DECAY_PERIOD)
			.unwrap();
		// floor(50 * 15 / 100) = 7
		assert_eq!(view.reputation, 43);
		assert_eq!(registry.solver(&solver()).unwrap().reputation, MIN_REPUTATION);
		assert_eq!(
			registry.ensure_eligible(&solver(), T0 + 3 * DECAY_PERIOD),
			Err(MarketError::InsufficientReputation {
				solver: solver(),
				reputation: 43
			})
		);
		assert!(registry.is_eligible(&solver(), T0));
	}

	#[tokio::test]
	async fn test_failure_penalty_and_bounds() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();

		let mut events = Vec::new();
		let record = registry
			.apply_reputation_delta(&solver(), false, 10, 10, T0, &mut events)
			.unwrap();
		// 50 - floor(50 / 20)
		assert_eq!(record.reputation, 48);
		assert_eq!(record.total_swaps, 1);
		assert_eq!(record.successful_swaps, 0);
		assert_eq!(record.avg_execution_time, 0);
		assert_eq!(
			events,
			vec![MarketEvent::Registry(RegistryEvent::ReputationUpdated {
				solver: solver(),
				new_reputation: 48,
				delta: -2
			})]
		);

		for i in 0..200 {
			let success = i % 3 != 0;
			let record = registry
				.apply_reputation_delta(&solver(), success, 5, 20_000, T0, &mut Vec::new())
				.unwrap();
			assert!(record.reputation <= MAX_REPUTATION);
		}
	}

	#[tokio::test]
	async fn test_average_execution_time_counts_successes_only() {
		let (mut registry, _) = setup();
		registry.stake(solver(), 100, T0, &mut Vec::new()).await.unwrap();
		registry
			.apply_reputation_delta(&solver(), true, 100, 0, T0, &mut Vec::new())
			.unwrap();
		registry
			.apply_reputation_delta(&solver(), false, 10_000, 0, T0, &mut Vec::new())
			.unwrap();
		let record = registry
			.apply_reputation_delta(&solver(), true, 201, 0, T0, &mut Vec::new())
			.unwrap();
		assert_eq!(record.avg_execution_time, 150);
		assert_eq!(record.total_swaps, 3);
		assert_eq!(record.successful_swaps, 2);
	}

	#[test]
	fn test_unknown_solver_delta_rejected() {
		let (mut registry, _) = setup();
		assert_eq!(
			registry.apply_reputation_delta(&solver(), true, 1, 1, T0, &mut Vec::new()),
			Err(MarketError::UnknownSolver(solver()))
		);
	}
}
