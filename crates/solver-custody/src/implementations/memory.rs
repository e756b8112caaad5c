//! In-memory fungible token ledger.
//!
//! Keeps balances per (token, holder) pair. Used by tests and by the service
//! when no external custody is wired in.

use crate::{BalanceEntry, CustodyError, CustodyInterface};
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use solver_types::{
	parse_amount, Address, Amount, ConfigSchema, Field, FieldType, Schema, TokenId,
	ValidationError,
};
use std::sync::Arc;
use tracing::debug;

/// In-memory ledger implementation.
pub struct MemoryLedger {
	custody_account: Address,
	balances: DashMap<(TokenId, Address), Amount>,
	frozen: DashSet<Address>,
}

impl MemoryLedger {
	pub fn new(custody_account: Address) -> Self {
		Self {
			custody_account,
			balances: DashMap::new(),
			frozen: DashSet::new(),
		}
	}

	/// Credits `amount` of `token` to `holder` out of thin air.
	pub fn mint(&self, token: TokenId, holder: Address, amount: Amount) {
		*self.balances.entry((token, holder)).or_insert(0) += amount;
	}

	/// Makes every transfer touching `account` fail until unfrozen.
	pub fn freeze(&self, account: Address) {
		self.frozen.insert(account);
	}

	pub fn unfreeze(&self, account: &Address) {
		self.frozen.remove(account);
	}

	pub fn balance(&self, token: &TokenId, holder: &Address) -> Amount {
		self.balances
			.get(&(*token, *holder))
			.map(|entry| *entry)
			.unwrap_or(0)
	}

	fn ensure_not_frozen(&self, account: &Address) -> Result<(), CustodyError> {
		if self.frozen.contains(account) {
			return Err(CustodyError::Frozen(*account));
		}
		Ok(())
	}

	fn move_funds(
		&self,
		token: &TokenId,
		from: &Address,
		to: &Address,
		amount: Amount,
	) -> Result<(), CustodyError> {
		self.ensure_not_frozen(from)?;
		self.ensure_not_frozen(to)?;

		if from == to {
			return Ok(());
		}

		let credited = self
			.balance(token, to)
			.checked_add(amount)
			.ok_or_else(|| CustodyError::Backend("balance overflow".to_string()))?;

		{
			let mut source = self.balances.entry((*token, *from)).or_insert(0);
			if *source < amount {
				return Err(CustodyError::InsufficientBalance {
					token: *token,
					holder: *from,
					needed: amount,
					available: *source,
				});
			}
			*source -= amount;
		}

		self.balances.insert((*token, *to), credited);

		debug!(%token, %from, %to, amount, "custody transfer");
		Ok(())
	}
}

#[async_trait]
impl CustodyInterface for MemoryLedger {
	fn custody_account(&self) -> Address {
		self.custody_account
	}

	async fn transfer_from(
		&self,
		token: &TokenId,
		from: &Address,
		amount: Amount,
	) -> Result<(), CustodyError> {
		self.move_funds(token, from, &self.custody_account, amount)
	}

	async fn transfer(
		&self,
		token: &TokenId,
		to: &Address,
		amount: Amount,
	) -> Result<(), CustodyError> {
		self.move_funds(token, &self.custody_account, to, amount)
	}

	async fn balance_of(&self, token: &TokenId, holder: &Address) -> Result<Amount, CustodyError> {
		Ok(self.balance(token, holder))
	}

	/// Nothing outlives the process here, so every non-zero balance is saved.
	fn export_balances(&self) -> Option<Vec<BalanceEntry>> {
		let mut balances: Vec<BalanceEntry> = self
			.balances
			.iter()
			.filter(|entry| *entry.value() > 0)
			.map(|entry| {
				let (token, holder) = *entry.key();
				BalanceEntry {
					token,
					holder,
					amount: *entry.value(),
				}
			})
			.collect();
		balances.sort_by_key(|entry| (entry.token, entry.holder));
		Some(balances)
	}

	fn restore_balances(&self, balances: Vec<BalanceEntry>) -> Result<(), CustodyError> {
		self.balances.clear();
		for entry in balances {
			self.mint(entry.token, entry.holder, entry.amount);
		}
		debug!(entries = self.balances.len(), "custody balances restored");
		Ok(())
	}
}

/// Configuration schema for MemoryLedger.
pub struct MemoryLedgerSchema;

impl ConfigSchema for MemoryLedgerSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let genesis_entry = Schema::new(
			vec![
				Field::new("token", FieldType::Address),
				Field::new("holder", FieldType::Address),
				Field::new("amount", FieldType::Amount),
			],
			vec![],
		);

		let schema = Schema::new(
			// Required fields
			vec![Field::new("custody_account", FieldType::Address)],
			// Optional fields
			vec![Field::new(
				"genesis",
				FieldType::Array(Box::new(FieldType::Table(genesis_entry))),
			)],
		);

		schema.validate(config)
	}
}

fn parse_address(raw: &str) -> Result<Address, CustodyError> {
	raw.parse()
		.map_err(|e: solver_types::ParseHexError| CustodyError::Backend(e.to_string()))
}

/// Factory function to create a custody backend from configuration.
///
/// Configuration parameters:
/// - `custody_account`: account holding the market's funds
/// - `genesis`: optional list of `{ token, holder, amount }` initial balances
pub fn create_custody(config: &toml::Value) -> Result<Arc<MemoryLedger>, CustodyError> {
	MemoryLedgerSchema
		.validate(config)
		.map_err(|e| CustodyError::Backend(e.to_string()))?;

	let custody_account = config
		.get("custody_account")
		.and_then(|v| v.as_str())
		.ok_or_else(|| CustodyError::Backend("custody_account is required".to_string()))
		.and_then(parse_address)?;

	let ledger = MemoryLedger::new(custody_account);

	if let Some(entries) = config.get("genesis").and_then(|v| v.as_array()) {
		for entry in entries {
			let token = entry.get("token").and_then(|v| v.as_str());
			let holder = entry.get("holder").and_then(|v| v.as_str());
			let amount = entry.get("amount").and_then(parse_amount);
			match (token, holder, amount) {
				(Some(token), Some(holder), Some(amount)) => {
					ledger.mint(parse_address(token)?, parse_address(holder)?, amount);
				}
				_ => {
					return Err(CustodyError::Backend(
						"genesis entries need token, holder and amount".to_string(),
					))
				}
			}
		}
	}

	Ok(Arc::new(ledger))
}
