//! Serializable image of the whole market.

use serde::{Deserialize, Serialize};
use solver_bids::BidBookState;
use solver_custody::BalanceEntry;
use solver_gateway::GatewayState;
use solver_intents::LedgerState;
use solver_registry::RegistryState;
use solver_types::Timestamp;

/// Storage namespace snapshots are kept under.
pub const SNAPSHOT_NAMESPACE: &str = "market";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSnapshot {
	pub saved_at: Timestamp,
	pub registry: RegistryState,
	pub bids: BidBookState,
	pub ledger: LedgerState,
	pub gateway: GatewayState,
	/// Custody balances, for backends that do not persist them themselves.
	#[serde(default)]
	pub custody: Option<Vec<BalanceEntry>>,
}
