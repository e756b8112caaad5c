//! Configuration file layout.

use serde::{Deserialize, Serialize};
use solver_types::serde_helpers::{deserialize_amount, serialize_amount};
use solver_types::{Address, Amount, ChainId, TokenId};

/// Complete market configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
	pub market: MarketSettings,
	/// Backend table for the custody collaborator.
	pub custody: toml::Value,
	/// Backend table for the proof verifier.
	#[serde(default = "empty_table")]
	pub verifier: toml::Value,
	/// Backend table for the messaging endpoint.
	pub messaging: toml::Value,
	#[serde(default = "empty_table")]
	pub storage: toml::Value,
	#[serde(default)]
	pub trusted_remotes: Vec<TrustedRemoteConfig>,
	#[serde(default)]
	pub remote_contracts: Vec<RemoteContractConfig>,
	#[serde(default)]
	pub authorized_solvers: Vec<Address>,
	#[serde(default)]
	pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketSettings {
	#[serde(default = "default_name")]
	pub name: String,
	pub local_chain_id: ChainId,
	/// Address of the local gateway.
	pub local_address: Address,
	/// Receives emergency withdrawals.
	pub admin_address: Address,
	pub staking_token: TokenId,
	#[serde(
		default = "default_min_stake",
		deserialize_with = "deserialize_amount",
		serialize_with = "serialize_amount"
	)]
	pub min_stake: Amount,
	#[serde(
		default,
		deserialize_with = "deserialize_amount",
		serialize_with = "serialize_amount"
	)]
	pub max_message_fee: Amount,
	#[serde(default)]
	pub alt_fee_token: Option<TokenId>,
	#[serde(
		default = "default_large_volume",
		deserialize_with = "deserialize_amount",
		serialize_with = "serialize_amount"
	)]
	pub large_volume_threshold: Amount,
	#[serde(
		default = "default_medium_volume",
		deserialize_with = "deserialize_amount",
		serialize_with = "serialize_amount"
	)]
	pub medium_volume_threshold: Amount,
	/// Storage id the market snapshot is saved under.
	#[serde(default = "default_snapshot_id")]
	pub snapshot_id: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Remote gateway allowed to deliver confirmations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustedRemoteConfig {
	pub chain_id: ChainId,
	/// Gateway address on the remote chain; the trusted path is this address
	/// followed by the local gateway address.
	pub remote_address: Address,
}

/// Gateway that receives confirmations for intents bound to `chain_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteContractConfig {
	pub chain_id: ChainId,
	pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_enabled")]
	pub enabled: bool,
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			enabled: default_api_enabled(),
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}

fn empty_table() -> toml::Value {
	toml::Value::Table(toml::Table::new())
}

fn default_name() -> String {
	"oif-market".to_string()
}

fn default_min_stake() -> Amount {
	1
}

const UNIT: Amount = 1_000_000_000_000_000_000;

fn default_large_volume() -> Amount {
	10_000 * UNIT
}

fn default_medium_volume() -> Amount {
	1_000 * UNIT
}

fn default_snapshot_id() -> String {
	"main".to_string()
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_api_enabled() -> bool {
	true
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}
