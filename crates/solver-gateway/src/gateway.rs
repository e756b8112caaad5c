use serde::{Deserialize, Serialize};
use solver_messaging::{EndpointInterface, OutboundPacket};
use solver_types::{
	remote_path, Address, AdminEvent, Amount, ChainId, CrossChainMessage, GatewayEvent, IntentId,
	MarketError, MarketEvent, Result, Timestamp, TokenId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Static gateway settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayParams {
	pub local_chain_id: ChainId,
	/// Address of this gateway; used as sender and refund address.
	pub local_address: Address,
	/// Largest fee the gateway pays for one confirmation.
	pub max_message_fee: Amount,
	/// Pay messaging fees in this token instead of the native one.
	pub alt_fee_token: Option<TokenId>,
	pub adapter_params: Vec<u8>,
}

/// Confirmation received from a remote gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Completion {
	pub source_chain: ChainId,
	pub owner: Address,
	pub token_out: TokenId,
	pub amount_out: Amount,
	pub success: bool,
	pub received_at: Timestamp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayState {
	pub trusted_remotes: HashMap<ChainId, Vec<u8>>,
	pub remote_contracts: HashMap<ChainId, Address>,
	pub completed_intents: HashMap<IntentId, Completion>,
}

/// A confirmation that passed every check and only needs sending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDispatch {
	pub message: CrossChainMessage,
	pub packet: OutboundPacket,
	pub fee: Amount,
}

pub struct CrossChainGateway {
	params: GatewayParams,
	state: GatewayState,
	endpoint: Arc<dyn EndpointInterface>,
}

impl CrossChainGateway {
	pub fn new(params: GatewayParams, endpoint: Arc<dyn EndpointInterface>) -> Self {
		Self {
			params,
			state: GatewayState::default(),
			endpoint,
		}
	}

	pub fn params(&self) -> &GatewayParams {
		&self.params
	}

	pub fn snapshot(&self) -> GatewayState {
		self.state.clone()
	}

	pub fn restore(&mut self, state: GatewayState) {
		self.state = state;
	}

	pub fn set_trusted_remote(
		&mut self,
		chain_id: ChainId,
		path: Vec<u8>,
		events: &mut Vec<MarketEvent>,
	) {
		info!(chain_id, path = %hex::encode(&path), "trusted remote set");
		self.state.trusted_remotes.insert(chain_id, path.clone());
		events.push(MarketEvent::Admin(AdminEvent::TrustedRemoteSet { chain_id, path }));
	}

	pub fn set_remote_contract(
		&mut self,
		chain_id: ChainId,
		address: Address,
		events: &mut Vec<MarketEvent>,
	) {
		info!(chain_id, %address, "remote contract set");
		self.state.remote_contracts.insert(chain_id, address);
		events.push(MarketEvent::Admin(AdminEvent::RemoteContractSet { chain_id, address }));
	}

	pub fn is_trusted_remote(&self, chain_id: ChainId, path: &[u8]) -> bool {
		self.state
			.trusted_remotes
			.get(&chain_id)
			.is_some_and(|trusted| !trusted.is_empty() && trusted.as_slice() == path)
	}

	pub fn remote_contract(&self, chain_id: ChainId) -> Option<Address> {
		self.state.remote_contracts.get(&chain_id).copied()
	}

	pub fn completion(&self, intent_id: IntentId) -> Option<&Completion> {
		self.state.completed_intents.get(&intent_id)
	}

	/// Builds the confirmation packet and quotes its fee without sending.
	pub async fn prepare_dispatch(
		&self,
		intent_id: IntentId,
		owner: Address,
		token_out: TokenId,
		amount_out: Amount,
		destination_chain: ChainId,
	) -> Result<PreparedDispatch> {
		let remote = self
			.remote_contract(destination_chain)
			.ok_or(MarketError::RemoteNotConfigured(destination_chain))?;

		let message = CrossChainMessage {
			intent_id,
			owner,
			token_out,
			amount_out,
			source_chain: self.params.local_chain_id,
			success: true,
		};
		let payload = message.encode()?;

		let use_alt_fee_token = self.params.alt_fee_token.is_some();
		let quote = self
			.endpoint
			.estimate_fees(
				destination_chain,
				&self.params.local_address,
				&payload,
				use_alt_fee_token,
				&self.params.adapter_params,
			)
			.await?;
		let fee = if use_alt_fee_token {
			quote.alt_fee
		} else {
			quote.native_fee
		};
		if fee > self.params.max_message_fee {
			return Err(MarketError::InsufficientFee {
				required: fee,
				budget: self.params.max_message_fee,
			});
		}

		let packet = OutboundPacket {
			destination_chain,
			destination_path: remote_path(&remote, &self.params.local_address),
			sender: self.params.local_address,
			payload,
			refund_address: self.params.local_address,
			alt_fee_token: self.params.alt_fee_token,
			adapter_params: self.params.adapter_params.clone(),
		};

		Ok(PreparedDispatch {
			message,
			packet,
			fee,
		})
	}

	/// Hands a prepared confirmation to the endpoint. One attempt, no retry.
	pub async fn send(
		&self,
		prepared: PreparedDispatch,
		events: &mut Vec<MarketEvent>,
	) -> Result<()> {
		let intent_id = prepared.message.intent_id;
		let destination_chain = prepared.packet.destination_chain;
		let fee = prepared.fee;

		self.endpoint.send(prepared.packet, fee).await?;

		events.push(MarketEvent::Gateway(GatewayEvent::CrossChainMessageSent {
			intent_id,
			destination_chain,
			fee,
		}));
		info!(intent_id, destination_chain, fee, "settlement confirmation dispatched");
		Ok(())
	}

	/// Prepares and sends a confirmation in one step.
	pub async fn dispatch(
		&self,
		intent_id: IntentId,
		owner: Address,
		token_out: TokenId,
		amount_out: Amount,
		destination_chain: ChainId,
		events: &mut Vec<MarketEvent>,
	) -> Result<Amount> {
		let prepared = self
			.prepare_dispatch(intent_id, owner, token_out, amount_out, destination_chain)
			.await?;
		let fee = prepared.fee;
		self.send(prepared, events).await?;
		Ok(fee)
	}

	/// Accepts a confirmation delivered by the endpoint.
	///
	/// `local_owner` resolves the owner of the matching local intent. A
	/// repeated confirmation for an intent already completed is accepted
	/// without emitting anything.
	#[allow(clippy::too_many_arguments)]
	pub fn receive(
		&mut self,
		caller: &Address,
		source_chain: ChainId,
		source_path: &[u8],
		payload: &[u8],
		local_owner: impl FnOnce(IntentId) -> Option<Address>,
		now: Timestamp,
		events: &mut Vec<MarketEvent>,
	) -> Result<CrossChainMessage> {
		if *caller != self.endpoint.address() {
			return Err(MarketError::Unauthorized);
		}
		if !self.is_trusted_remote(source_chain, source_path) {
			return Err(MarketError::UntrustedRemote {
				chain_id: source_chain,
			});
		}

		let message = CrossChainMessage::decode(payload)?;
		let owner = local_owner(message.intent_id)
			.ok_or(MarketError::UnknownIntent(message.intent_id))?;
		if owner != message.owner {
			return Err(MarketError::OwnerMismatch(message.intent_id));
		}

		if self.state.completed_intents.contains_key(&message.intent_id) {
			debug!(
				intent_id = message.intent_id,
				source_chain, "duplicate settlement confirmation ignored"
			);
			return Ok(message);
		}

		self.state.completed_intents.insert(
			message.intent_id,
			Completion {
				source_chain,
				owner: message.owner,
				token_out: message.token_out,
				amount_out: message.amount_out,
				success: message.success,
				received_at: now,
			},
		);
		events.push(MarketEvent::Gateway(GatewayEvent::CrossChainSwapCompleted {
			intent_id: message.intent_id,
			owner: message.owner,
			amount_out: message.amount_out,
			source_chain,
		}));
		info!(
			intent_id = message.intent_id,
			source_chain,
			amount_out = message.amount_out,
			"cross-chain swap completed"
		);

		Ok(message)
	}
}
