//! Pushes fulfillment outcomes into the solver registry.

use solver_registry::SolverRegistry;
use solver_types::{
	Address, Amount, IntentId, MarketEvent, RegistryEvent, Result, SolverRecord, Timestamp,
};

pub(crate) struct PerformanceTracker;

impl PerformanceTracker {
	#[allow(clippy::too_many_arguments)]
	pub(crate) fn record(
		registry: &mut SolverRegistry,
		solver: &Address,
		intent_id: IntentId,
		success: bool,
		execution_time: u64,
		volume: Amount,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<SolverRecord> {
		let record =
			registry.apply_reputation_delta(solver, success, execution_time, volume, now, events)?;
		events.push(MarketEvent::Registry(RegistryEvent::SwapExecuted {
			solver: *solver,
			intent_id,
			success,
		}));
		Ok(record)
	}
}
