//! Market configuration loading.
//!
//! The configuration is a TOML file. `${VAR}` references are replaced from
//! the environment before parsing, a few settings can be overridden with
//! `MARKET_*` variables, and cross-field rules are checked after parsing.

use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "MARKET_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<MarketConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		let content = match tokio::fs::read_to_string(file_path).await {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
				return Err(ConfigError::FileNotFound(file_path.clone()))
			}
			Err(e) => return Err(e.into()),
		};
		info!(path = %file_path, "loading configuration");

		self.load_from_str(&content)
	}

	/// Parses, overrides and validates configuration text.
	pub fn load_from_str(&self, content: &str) -> Result<MarketConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;
		let mut config: MarketConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;
		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut MarketConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!(%log_level, "log level overridden from environment");
			config.market.log_level = log_level;
		}

		if let Ok(port) = env::var(format!("{}API_PORT", self.env_prefix)) {
			config.api.port = port
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid API port: {}", e)))?;
		}

		Ok(())
	}
}

/// Replaces every `${VAR_NAME}` with the value of the environment variable.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut result = content.to_string();
	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

fn validate_config(config: &MarketConfig) -> Result<(), ConfigError> {
	let market = &config.market;

	if market.local_chain_id == 0 {
		return Err(ConfigError::ValidationError(
			"local_chain_id must be non-zero".to_string(),
		));
	}

	if market.medium_volume_threshold > market.large_volume_threshold {
		return Err(ConfigError::ValidationError(format!(
			"medium_volume_threshold ({}) exceeds large_volume_threshold ({})",
			market.medium_volume_threshold, market.large_volume_threshold
		)));
	}

	if market.snapshot_id.trim().is_empty() {
		return Err(ConfigError::ValidationError(
			"snapshot_id must not be empty".to_string(),
		));
	}

	let mut seen = HashSet::new();
	for remote in &config.trusted_remotes {
		if remote.chain_id == market.local_chain_id {
			return Err(ConfigError::ValidationError(format!(
				"Trusted remote on local chain {}",
				remote.chain_id
			)));
		}
		if !seen.insert(remote.chain_id) {
			return Err(ConfigError::ValidationError(format!(
				"Duplicate trusted remote for chain {}",
				remote.chain_id
			)));
		}
	}

	for contract in &config.remote_contracts {
		if contract.chain_id == market.local_chain_id {
			return Err(ConfigError::ValidationError(format!(
				"Remote contract on local chain {}",
				contract.chain_id
			)));
		}
	}

	for (section, value) in [
		("custody", &config.custody),
		("verifier", &config.verifier),
		("messaging", &config.messaging),
		("storage", &config.storage),
	] {
		if !value.is_table() {
			return Err(ConfigError::ValidationError(format!(
				"[{}] must be a table",
				section
			)));
		}
	}

	Ok(())
}
