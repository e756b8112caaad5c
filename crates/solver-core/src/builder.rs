//! Assembles a [`Market`] from configuration.
//!
//! Each collaborator is created by a factory closure. The defaults use the
//! backends shipped with the workspace; tests and embedders can swap any of
//! them to keep a handle on the concrete backend.

use crate::admin::AdminToken;
use crate::market::{Market, MarketState};
use solver_bids::BidBook;
use solver_config::MarketConfig;
use solver_custody::CustodyInterface;
use solver_gateway::{CrossChainGateway, GatewayParams};
use solver_intents::{IntentLedger, LedgerParams};
use solver_messaging::EndpointInterface;
use solver_registry::{RegistryParams, SolverRegistry, VolumeThresholds};
use solver_storage::{StorageInterface, StorageService};
use solver_types::{remote_path, ChainId, Clock, EventBus, SystemClock};
use solver_verifier::VerifierInterface;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum BuildError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

type CustodyFactory =
	Box<dyn Fn(&toml::Value) -> Result<Arc<dyn CustodyInterface>, BuildError> + Send>;
type VerifierFactory =
	Box<dyn Fn(&toml::Value) -> Result<Arc<dyn VerifierInterface>, BuildError> + Send>;
type EndpointFactory =
	Box<dyn Fn(&toml::Value, ChainId) -> Result<Arc<dyn EndpointInterface>, BuildError> + Send>;
type StorageFactory =
	Box<dyn Fn(&toml::Value) -> Result<Arc<dyn StorageInterface>, BuildError> + Send>;

const DEFAULT_EVENT_CAPACITY: usize = 1000;

pub struct MarketBuilder {
	config: MarketConfig,
	custody_factory: CustodyFactory,
	verifier_factory: VerifierFactory,
	endpoint_factory: EndpointFactory,
	storage_factory: StorageFactory,
	clock: Arc<dyn Clock>,
	event_capacity: usize,
}

impl MarketBuilder {
	pub fn new(config: MarketConfig) -> Self {
		Self {
			config,
			custody_factory: Box::new(|config| {
				let custody = solver_custody::implementations::memory::create_custody(config)
					.map_err(|e| BuildError::Backend(e.to_string()))?;
				Ok(custody as Arc<dyn CustodyInterface>)
			}),
			verifier_factory: Box::new(|config| {
				solver_verifier::create_verifier(config)
					.map_err(|e| BuildError::Backend(e.to_string()))
			}),
			endpoint_factory: Box::new(|config, chain_id| {
				let endpoint =
					solver_messaging::implementations::loopback::create_endpoint(config, chain_id)
						.map_err(|e| BuildError::Backend(e.to_string()))?;
				Ok(endpoint as Arc<dyn EndpointInterface>)
			}),
			storage_factory: Box::new(|config| {
				solver_storage::create_storage(config)
					.map_err(|e| BuildError::Backend(e.to_string()))
			}),
			clock: Arc::new(SystemClock),
			event_capacity: DEFAULT_EVENT_CAPACITY,
		}
	}

	pub fn with_custody_factory<F>(mut self, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Arc<dyn CustodyInterface>, BuildError> + Send + 'static,
	{
		self.custody_factory = Box::new(factory);
		self
	}

	pub fn with_verifier_factory<F>(mut self, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Arc<dyn VerifierInterface>, BuildError> + Send + 'static,
	{
		self.verifier_factory = Box::new(factory);
		self
	}

	pub fn with_endpoint_factory<F>(mut self, factory: F) -> Self
	where
		F: Fn(&toml::Value, ChainId) -> Result<Arc<dyn EndpointInterface>, BuildError>
			+ Send
			+ 'static,
	{
		self.endpoint_factory = Box::new(factory);
		self
	}

	pub fn with_storage_factory<F>(mut self, factory: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<Arc<dyn StorageInterface>, BuildError> + Send + 'static,
	{
		self.storage_factory = Box::new(factory);
		self
	}

	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;
		self
	}

	pub fn with_event_capacity(mut self, capacity: usize) -> Self {
		self.event_capacity = capacity;
		self
	}

	/// Creates the market and the only admin token that governs it.
	pub fn build(self) -> Result<(Market, AdminToken), BuildError> {
		let settings = &self.config.market;
		if self.event_capacity == 0 {
			return Err(BuildError::Config(
				"event capacity must be non-zero".to_string(),
			));
		}

		let custody = (self.custody_factory)(&self.config.custody)?;
		let verifier = (self.verifier_factory)(&self.config.verifier)?;
		let endpoint = (self.endpoint_factory)(&self.config.messaging, settings.local_chain_id)?;
		let storage = StorageService::new((self.storage_factory)(&self.config.storage)?);

		if endpoint.chain_id() != settings.local_chain_id {
			return Err(BuildError::Config(format!(
				"endpoint is on chain {} but the market is on chain {}",
				endpoint.chain_id(),
				settings.local_chain_id
			)));
		}

		let registry = SolverRegistry::new(
			RegistryParams {
				staking_token: settings.staking_token,
				min_stake: settings.min_stake,
				volume_thresholds: VolumeThresholds {
					large: settings.large_volume_threshold,
					medium: settings.medium_volume_threshold,
				},
			},
			custody.clone(),
		);
		let mut ledger = IntentLedger::new(
			LedgerParams {
				local_chain_id: settings.local_chain_id,
				admin_address: settings.admin_address,
			},
			custody.clone(),
			verifier,
		);
		let mut gateway = CrossChainGateway::new(
			GatewayParams {
				local_chain_id: settings.local_chain_id,
				local_address: settings.local_address,
				max_message_fee: settings.max_message_fee,
				alt_fee_token: settings.alt_fee_token,
				adapter_params: Vec::new(),
			},
			endpoint,
		);

		// Seeding from configuration is not an audited admin action.
		let mut seeded = Vec::new();
		for remote in &self.config.trusted_remotes {
			gateway.set_trusted_remote(
				remote.chain_id,
				remote_path(&remote.remote_address, &settings.local_address),
				&mut seeded,
			);
		}
		for contract in &self.config.remote_contracts {
			gateway.set_remote_contract(contract.chain_id, contract.address, &mut seeded);
		}
		for solver in &self.config.authorized_solvers {
			ledger.authorize_solver(*solver, true, &mut seeded);
		}

		let (token, admin_key) = AdminToken::mint();
		info!(
			name = %settings.name,
			chain_id = settings.local_chain_id,
			trusted_remotes = self.config.trusted_remotes.len(),
			authorized_solvers = self.config.authorized_solvers.len(),
			"market built"
		);

		let market = Market::new(
			settings.name.clone(),
			settings.local_chain_id,
			admin_key,
			settings.snapshot_id.clone(),
			custody,
			MarketState {
				registry,
				bids: BidBook::new(),
				ledger,
				gateway,
			},
			self.clock,
			storage,
			EventBus::new(self.event_capacity),
		);
		Ok((market, token))
	}
}
