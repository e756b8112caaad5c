//! Bid storage and matching.
//!
//! Bids are kept per intent in insertion order. The book itself knows
//! nothing about intent status; the market engine checks that before
//! calling in.

use crate::scoring::score;
use serde::{Deserialize, Serialize};
use solver_registry::SolverRegistry;
use solver_types::{
	Address, Amount, BestBid, Bid, BidEvent, IntentId, MarketError, MarketEvent, Result,
	Timestamp,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Parameters of a bid submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBid {
	pub solver: Address,
	pub intent_id: IntentId,
	pub amount_out: Amount,
	pub gas_estimate: u64,
	pub execution_time: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidBookState {
	pub bids: HashMap<IntentId, Vec<Bid>>,
}

#[derive(Debug, Default)]
pub struct BidBook {
	state: BidBookState,
}

impl BidBook {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn snapshot(&self) -> BidBookState {
		self.state.clone()
	}

	pub fn restore(&mut self, state: BidBookState) {
		self.state = state;
	}

	/// Appends a bid and returns its index within the intent's collection.
	///
	/// Eligibility is judged on the solver's decayed reputation at `now`.
	pub fn place_bid(
		&mut self,
		registry: &SolverRegistry,
		bid: NewBid,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<usize> {
		if bid.amount_out == 0 {
			return Err(MarketError::InvalidAmount);
		}
		registry.ensure_eligible(&bid.solver, now)?;

		let slots = self.state.bids.entry(bid.intent_id).or_default();
		let index = slots.len();
		slots.push(Bid {
			solver: bid.solver,
			intent_id: bid.intent_id,
			amount_out: bid.amount_out,
			gas_estimate: bid.gas_estimate,
			execution_time: bid.execution_time,
			bid_time: now,
			accepted: false,
		});

		events.push(MarketEvent::Bid(BidEvent::BidPlaced {
			intent_id: bid.intent_id,
			index,
			solver: bid.solver,
			amount_out: bid.amount_out,
		}));
		info!(
			intent_id = bid.intent_id,
			index,
			solver = %bid.solver,
			amount_out = bid.amount_out,
			"bid placed"
		);

		Ok(index)
	}

	/// Marks a bid slot as accepted. A slot can be accepted only once.
	pub fn accept_bid(
		&mut self,
		intent_id: IntentId,
		index: usize,
		events: &mut Vec<MarketEvent>,
	) -> Result<Bid> {
		let bid = self
			.state
			.bids
			.get_mut(&intent_id)
			.and_then(|slots| slots.get_mut(index))
			.ok_or(MarketError::InvalidBidIndex { intent_id, index })?;
		if bid.accepted {
			return Err(MarketError::AlreadyAccepted { intent_id, index });
		}
		bid.accepted = true;

		events.push(MarketEvent::Bid(BidEvent::BidAccepted {
			intent_id,
			index,
			solver: bid.solver,
		}));
		info!(intent_id, index, solver = %bid.solver, "bid accepted");

		Ok(bid.clone())
	}

	/// Highest scoring unaccepted bid from a currently eligible solver.
	///
	/// Ties keep the earliest bid.
	pub fn best_bid(
		&self,
		registry: &SolverRegistry,
		intent_id: IntentId,
		now: Timestamp,
	) -> BestBid {
		let slots = match self.state.bids.get(&intent_id) {
			Some(slots) if !slots.is_empty() => slots,
			_ => return BestBid::NoBids,
		};

		let mut best: Option<(usize, u128)> = None;
		for (index, bid) in slots.iter().enumerate() {
			if bid.accepted {
				continue;
			}
			let reputation = match registry.solver_stats(&bid.solver, now) {
				Some(view) if view.is_eligible() => view.reputation,
				_ => continue,
			};
			let bid_score = score(reputation, bid.amount_out, bid.execution_time);
			debug!(intent_id, index, reputation, score = %bid_score, "bid scored");
			if best.map_or(true, |(_, top)| bid_score > top) {
				best = Some((index, bid_score));
			}
		}

		match best {
			Some((index, score)) => BestBid::Found {
				index,
				bid: slots[index].clone(),
				score,
			},
			None => BestBid::NoEligibleBid,
		}
	}

	/// Bids for an intent in insertion order.
	pub fn bids(&self, intent_id: IntentId) -> Vec<Bid> {
		self.state.bids.get(&intent_id).cloned().unwrap_or_default()
	}

	pub fn has_accepted_bid(&self, intent_id: IntentId) -> bool {
		self.state
			.bids
			.get(&intent_id)
			.is_some_and(|slots| slots.iter().any(|bid| bid.accepted))
	}

	/// Whether `solver` owns an accepted bid on the intent.
	pub fn is_accepted_solver(&self, intent_id: IntentId, solver: &Address) -> bool {
		self.state.bids.get(&intent_id).is_some_and(|slots| {
			slots
				.iter()
				.any(|bid| bid.accepted && bid.solver == *solver)
		})
	}

	pub fn bid_count(&self) -> usize {
		self.state.bids.values().map(Vec::len).sum()
	}
}
