//! Solver market engine.
//!
//! Ties the registry, bid book, intent ledger and cross-chain gateway
//! together behind a single serialized entry point, publishes committed
//! events and persists snapshots through the storage service.

pub mod admin;
pub mod builder;
pub mod market;
pub mod snapshot;

pub use admin::AdminToken;
pub use builder::{BuildError, MarketBuilder};
pub use market::{Market, MarketStats};
pub use snapshot::{MarketSnapshot, SNAPSHOT_NAMESPACE};

pub use solver_bids::NewBid;
pub use solver_gateway::Completion;
pub use solver_intents::Fulfillment;
