//! Proof verification for intent fulfillment.
//!
//! A fulfilling solver presents a proof that must open the commitment stored
//! on the intent. The check itself is delegated to a verifier backend so the
//! policy can be swapped without touching the ledger.

use async_trait::async_trait;
use solver_types::{Hash32, MarketError};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod commitment;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifierError {
	#[error("Unsupported verification policy: {0}")]
	UnsupportedPolicy(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<VerifierError> for MarketError {
	fn from(err: VerifierError) -> Self {
		MarketError::Verifier(err.to_string())
	}
}

#[async_trait]
pub trait VerifierInterface: Send + Sync {
	/// Name of the verification policy, for logs.
	fn policy(&self) -> &'static str;

	/// Returns whether `proof` opens `commitment`.
	///
	/// `Ok(false)` is a proof mismatch; `Err` means the check could not run.
	async fn verify(&self, proof: &[u8], commitment: &Hash32) -> Result<bool, VerifierError>;
}

/// Factory function to create a verifier from configuration.
///
/// Configuration parameters:
/// - `policy`: verification policy (default and only supported: "commitment")
pub fn create_verifier(config: &toml::Value) -> Result<Arc<dyn VerifierInterface>, VerifierError> {
	let policy = config
		.get("policy")
		.and_then(|v| v.as_str())
		.unwrap_or(implementations::commitment::POLICY);

	match policy {
		implementations::commitment::POLICY => {
			Ok(Arc::new(implementations::commitment::CommitmentVerifier))
		}
		other => Err(VerifierError::UnsupportedPolicy(other.to_string())),
	}
}
