//! Token custody for the solver market.
//!
//! The market never moves tokens itself. It asks a custody backend to pull
//! funds from an account into the market's custody account, or to pay funds
//! out of it. Any failure reported here aborts the calling market operation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solver_types::serde_helpers::{deserialize_amount, serialize_amount};
use solver_types::{Address, Amount, MarketError, TokenId};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod memory;
}

/// Errors that can occur during custody operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustodyError {
	/// The debited account does not hold enough of the token.
	#[error("Insufficient balance of {token} for {holder}: need {needed}, have {available}")]
	InsufficientBalance {
		token: TokenId,
		holder: Address,
		needed: Amount,
		available: Amount,
	},
	/// The account has been frozen by the backend.
	#[error("Account {0} is frozen")]
	Frozen(Address),
	/// Error that occurs in the custody backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<CustodyError> for MarketError {
	fn from(err: CustodyError) -> Self {
		MarketError::Custody(err.to_string())
	}
}

/// A holder's balance of one token, as persisted in market snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
	pub token: TokenId,
	pub holder: Address,
	#[serde(
		serialize_with = "serialize_amount",
		deserialize_with = "deserialize_amount"
	)]
	pub amount: Amount,
}

/// Interface every custody backend implements.
#[async_trait]
pub trait CustodyInterface: Send + Sync {
	/// Account that holds funds on behalf of the market.
	fn custody_account(&self) -> Address;

	/// Pulls `amount` of `token` from `from` into the custody account.
	async fn transfer_from(
		&self,
		token: &TokenId,
		from: &Address,
		amount: Amount,
	) -> Result<(), CustodyError>;

	/// Pays `amount` of `token` out of the custody account to `to`.
	async fn transfer(&self, token: &TokenId, to: &Address, amount: Amount)
		-> Result<(), CustodyError>;

	/// Current balance of `holder`.
	async fn balance_of(&self, token: &TokenId, holder: &Address) -> Result<Amount, CustodyError>;

	/// Balances that must be saved with the market state.
	///
	/// `None` means the backend keeps its own books and nothing is saved.
	fn export_balances(&self) -> Option<Vec<BalanceEntry>> {
		None
	}

	/// Replaces every balance with a previously exported set.
	fn restore_balances(&self, _balances: Vec<BalanceEntry>) -> Result<(), CustodyError> {
		Err(CustodyError::Backend("backend cannot restore balances".to_string()))
	}
}
