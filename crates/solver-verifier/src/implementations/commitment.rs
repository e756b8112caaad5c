//! Hash-commitment verifier.
//!
//! The intent commitment is `keccak256(proof)`. A proof is valid exactly when
//! its digest equals the stored commitment.

use crate::{VerifierError, VerifierInterface};
use async_trait::async_trait;
use solver_types::{keccak256, Hash32};

pub const POLICY: &str = "commitment";

pub struct CommitmentVerifier;

impl CommitmentVerifier {
	/// Commitment a creator should store for a given proof preimage.
	pub fn commit(proof: &[u8]) -> Hash32 {
		keccak256(proof)
	}
}

#[async_trait]
impl VerifierInterface for CommitmentVerifier {
	fn policy(&self) -> &'static str {
		POLICY
	}

	async fn verify(&self, proof: &[u8], commitment: &Hash32) -> Result<bool, VerifierError> {
		if proof.is_empty() {
			return Ok(false);
		}
		Ok(&keccak256(proof) == commitment)
	}
}
