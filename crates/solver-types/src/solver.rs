//! Solver records held by the registry.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, Timestamp, MIN_REPUTATION};

/// Stake, reputation and performance history of one solver.
///
/// `active` always mirrors `stake > 0`. Swap history survives a full unstake,
/// reputation does not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverRecord {
	pub address: Address,
	pub stake: Amount,
	pub reputation: u64,
	pub active: bool,
	pub last_reputation_update: Timestamp,
	pub total_swaps: u64,
	pub successful_swaps: u64,
	pub total_volume: Amount,
	/// Mean execution time over successful swaps only, in seconds.
	pub avg_execution_time: u64,
}

impl SolverRecord {
	/// Fresh record for a first-time staker.
	pub fn new(address: Address, stake: Amount, now: Timestamp) -> Self {
		Self {
			address,
			stake,
			reputation: MIN_REPUTATION,
			active: stake > 0,
			last_reputation_update: now,
			total_swaps: 0,
			successful_swaps: 0,
			total_volume: 0,
			avg_execution_time: 0,
		}
	}

	/// Whether the solver may bid and be selected.
	pub fn is_eligible(&self) -> bool {
		self.active && self.reputation >= MIN_REPUTATION
	}
}
