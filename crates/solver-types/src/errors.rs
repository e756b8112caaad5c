//! Error types for the solver market.

use crate::common::{Address, Amount, ChainId, IntentId, Timestamp};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarketError>;

/// Broad failure classes. Every [`MarketError`] belongs to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Bad amounts, deadlines, chains or payloads supplied by the caller.
	Validation,
	/// Caller, solver or remote is not allowed to perform the operation.
	Authorization,
	/// The operation conflicts with the current state of a record.
	State,
	/// Proof or cross-chain data does not match what was committed.
	Integrity,
	/// A collaborator (custody, endpoint, verifier, storage) failed.
	External,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
	#[error("Invalid amount")]
	InvalidAmount,

	#[error("Invalid deadline {deadline} (now {now})")]
	InvalidDeadline { deadline: Timestamp, now: Timestamp },

	#[error("Destination chain {0} is the local chain")]
	SameChain(ChainId),

	#[error("Malformed cross-chain payload: {0}")]
	MalformedPayload(String),

	#[error("Message fee {required} exceeds budget {budget}")]
	InsufficientFee { required: Amount, budget: Amount },

	#[error("Unauthorized caller")]
	Unauthorized,

	#[error("Solver {0} is not authorized")]
	UnauthorizedSolver(Address),

	#[error("Untrusted remote on chain {chain_id}")]
	UntrustedRemote { chain_id: ChainId },

	#[error("Unknown intent {0}")]
	UnknownIntent(IntentId),

	#[error("Unknown solver {0}")]
	UnknownSolver(Address),

	#[error("Intent {0} already fulfilled")]
	AlreadyFulfilled(IntentId),

	#[error("Intent {0} expired")]
	Expired(IntentId),

	#[error("Intent {intent_id} deadline {deadline} has passed")]
	DeadlinePassed {
		intent_id: IntentId,
		deadline: Timestamp,
	},

	#[error("Intent {intent_id} does not expire before {deadline}")]
	NotExpired {
		intent_id: IntentId,
		deadline: Timestamp,
	},

	#[error("Insufficient output: offered {offered}, minimum {minimum}")]
	InsufficientOutput { offered: Amount, minimum: Amount },

	#[error("Insufficient stake: required {required}, available {available}")]
	InsufficientStake { required: Amount, available: Amount },

	#[error("Solver {0} is inactive")]
	InactiveSolver(Address),

	#[error("Solver {solver} reputation {reputation} below minimum")]
	InsufficientReputation { solver: Address, reputation: u64 },

	#[error("Invalid bid index {index} for intent {intent_id}")]
	InvalidBidIndex { intent_id: IntentId, index: usize },

	#[error("Bid {index} for intent {intent_id} already accepted")]
	AlreadyAccepted { intent_id: IntentId, index: usize },

	#[error("No remote contract configured for chain {0}")]
	RemoteNotConfigured(ChainId),

	#[error("Invalid proof for intent {0}")]
	InvalidProof(IntentId),

	#[error("Owner mismatch for intent {0}")]
	OwnerMismatch(IntentId),

	#[error("Custody error: {0}")]
	Custody(String),

	#[error("Endpoint error: {0}")]
	Endpoint(String),

	#[error("Verifier error: {0}")]
	Verifier(String),

	#[error("Storage error: {0}")]
	Storage(String),
}

impl MarketError {
	/// Classifies the error into the broad failure taxonomy.
	pub fn kind(&self) -> ErrorKind {
		use MarketError::*;
		match self {
			InvalidAmount
			| InvalidDeadline { .. }
			| SameChain(_)
			| MalformedPayload(_)
			| InsufficientOutput { .. }
			| InsufficientFee { .. } => ErrorKind::Validation,
			Unauthorized | UnauthorizedSolver(_) | UntrustedRemote { .. } => {
				ErrorKind::Authorization
			}
			UnknownIntent(_)
			| UnknownSolver(_)
			| AlreadyFulfilled(_)
			| Expired(_)
			| DeadlinePassed { .. }
			| NotExpired { .. }
			| InsufficientStake { .. }
			| InactiveSolver(_)
			| InsufficientReputation { .. }
			| InvalidBidIndex { .. }
			| AlreadyAccepted { .. }
			| RemoteNotConfigured(_) => ErrorKind::State,
			InvalidProof(_) | OwnerMismatch(_) => ErrorKind::Integrity,
			Custody(_) | Endpoint(_) | Verifier(_) | Storage(_) => ErrorKind::External,
		}
	}
}
