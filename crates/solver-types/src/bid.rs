//! Bid types for the solver market.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, IntentId, Timestamp};

/// One solver offer against an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
	pub solver: Address,
	pub intent_id: IntentId,
	/// Output amount the solver promises to deliver.
	pub amount_out: Amount,
	pub gas_estimate: u64,
	/// Claimed execution time in seconds.
	pub execution_time: u64,
	pub bid_time: Timestamp,
	/// Flips to true at most once.
	pub accepted: bool,
}

/// Outcome of selecting the best bid for an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BestBid {
	/// Highest scoring unaccepted bid from an eligible solver.
	Found { index: usize, bid: Bid, score: u128 },
	/// The intent has no bids at all.
	NoBids,
	/// Bids exist but none is unaccepted and from an eligible solver.
	NoEligibleBid,
}

impl BestBid {
	pub fn found(&self) -> Option<(usize, &Bid)> {
		match self {
			BestBid::Found { index, bid, .. } => Some((*index, bid)),
			_ => None,
		}
	}
}
