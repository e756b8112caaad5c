//! Reputation arithmetic.
//!
//! All functions are pure and use integer arithmetic with floor division.

use serde::{Deserialize, Serialize};
use solver_types::{
	Amount, Timestamp, DECAY_PERIOD, DECAY_RATE_PERCENT, MAX_REPUTATION,
};

/// Volume levels that earn a larger reputation bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeThresholds {
	pub large: Amount,
	pub medium: Amount,
}

impl Default for VolumeThresholds {
	fn default() -> Self {
		const UNIT: Amount = 1_000_000_000_000_000_000;
		Self {
			large: 10_000 * UNIT,
			medium: 1_000 * UNIT,
		}
	}
}

/// Number of whole decay periods between `last_update` and `now`.
pub fn elapsed_periods(last_update: Timestamp, now: Timestamp) -> u64 {
	now.saturating_sub(last_update) / DECAY_PERIOD
}

/// Reputation after `periods` decay periods.
pub fn decay(reputation: u64, periods: u64) -> u64 {
	if periods == 0 {
		return reputation;
	}
	let loss = reputation as u128 * DECAY_RATE_PERCENT as u128 * periods as u128 / 100;
	if loss >= reputation as u128 {
		0
	} else {
		reputation - loss as u64
	}
}

pub fn time_bonus(execution_time: u64) -> u64 {
	if execution_time < 60 {
		10
	} else if execution_time < 300 {
		5
	} else {
		1
	}
}

pub fn volume_bonus(volume: Amount, thresholds: &VolumeThresholds) -> u64 {
	if volume > thresholds.large {
		5
	} else if volume > thresholds.medium {
		3
	} else {
		1
	}
}

/// Reputation after a successful swap.
pub fn reward(
	reputation: u64,
	execution_time: u64,
	volume: Amount,
	thresholds: &VolumeThresholds,
) -> u64 {
	let increase = time_bonus(execution_time) + volume_bonus(volume, thresholds);
	reputation.saturating_add(increase).min(MAX_REPUTATION)
}

/// Reputation after a failed swap: loses a twentieth, rounded down.
pub fn penalize(reputation: u64) -> u64 {
	let decrease = reputation / 20;
	if reputation > decrease {
		reputation - decrease
	} else {
		0
	}
}

/// Running mean of execution time over `successful_swaps` samples, the newest
/// being `execution_time`.
pub fn rolling_average(previous_avg: u64, successful_swaps: u64, execution_time: u64) -> u64 {
	if successful_swaps == 0 {
		return previous_avg;
	}
	let total = previous_avg as u128 * (successful_swaps - 1) as u128 + execution_time as u128;
	(total / successful_swaps as u128) as u64
}
