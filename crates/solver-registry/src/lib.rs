//! Solver registry: stake, reputation and performance history per solver.
//!
//! Reputation decays lazily. Nothing runs in the background; any mutating
//! touch of a solver record first applies the decay accrued since the last
//! update, and read paths compute the decayed value without storing it.

pub mod registry;
pub mod reputation;

pub use registry::{RegistryParams, RegistryState, SolverRegistry};
pub use reputation::VolumeThresholds;
