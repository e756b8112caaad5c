//! Swap intent types for the solver market.
//!
//! An intent is a deadline-bound request to swap `token_in` for `token_out`
//! on a destination chain. Intents are never deleted; their status only moves
//! forward from `Open` to one of the terminal states.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, ChainId, Hash32, IntentId, Timestamp, TokenId};

/// Lifecycle status of a swap intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntentStatus {
	Open,
	Fulfilled,
	Expired,
}

impl IntentStatus {
	pub fn is_terminal(&self) -> bool {
		!matches!(self, IntentStatus::Open)
	}
}

/// A recorded swap request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapIntent {
	/// Sequential identifier, unique per ledger.
	pub id: IntentId,
	/// Account that created the intent and receives output or refunds.
	pub owner: Address,
	pub token_in: TokenId,
	pub token_out: TokenId,
	/// Amount locked in custody at creation.
	pub amount_in: Amount,
	/// Minimum output the owner accepts.
	pub min_amount_out: Amount,
	pub destination_chain: ChainId,
	pub created_at: Timestamp,
	pub deadline: Timestamp,
	pub status: IntentStatus,
	/// Opaque commitment a fulfilling proof must open.
	pub commitment: Hash32,
	/// Solver that fulfilled the intent, if any.
	pub solver: Option<Address>,
}

impl SwapIntent {
	pub fn is_open(&self) -> bool {
		self.status == IntentStatus::Open
	}
}

/// Caller-supplied parameters for creating an intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIntent {
	pub owner: Address,
	pub token_in: TokenId,
	pub token_out: TokenId,
	pub amount_in: Amount,
	pub min_amount_out: Amount,
	pub destination_chain: ChainId,
	pub deadline: Timestamp,
	pub commitment: Hash32,
}
