//! Shared types for the solver market.
//!
//! Holds the domain records (intents, solvers, bids), the cross-chain payload,
//! the error taxonomy, audit events and the configuration schema helpers used
//! by every other crate in the workspace.

pub mod bid;
pub mod clock;
pub mod common;
pub mod errors;
pub mod events;
pub mod intent;
pub mod message;
pub mod serde_helpers;
pub mod solver;
pub mod validation;

pub use bid::*;
pub use clock::*;
pub use common::*;
pub use errors::*;
pub use events::*;
pub use intent::*;
pub use message::*;
pub use solver::*;
pub use validation::*;
