//! Cross-chain messaging endpoint abstraction.
//!
//! The endpoint carries opaque payloads between gateway instances on
//! different chains. Delivery is asynchronous and may be delayed, reordered
//! or dropped; the market only relies on a synchronous accept/reject from
//! `send` and on the endpoint authenticating inbound deliveries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use solver_types::{Address, Amount, ChainId, MarketError};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod loopback;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EndpointError {
	#[error("Fee {paid} below required {required}")]
	InsufficientFee { paid: Amount, required: Amount },
	#[error("Send rejected: {0}")]
	Rejected(String),
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<EndpointError> for MarketError {
	fn from(err: EndpointError) -> Self {
		MarketError::Endpoint(err.to_string())
	}
}

/// Fee quote for sending a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeQuote {
	pub native_fee: Amount,
	pub alt_fee: Amount,
}

/// Message handed to the endpoint for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPacket {
	pub destination_chain: ChainId,
	/// Trusted path of the destination gateway (remote ++ local address).
	pub destination_path: Vec<u8>,
	/// Gateway that sent the packet.
	pub sender: Address,
	pub payload: Vec<u8>,
	pub refund_address: Address,
	/// Pay fees in an alternative token instead of the native one.
	pub alt_fee_token: Option<Address>,
	pub adapter_params: Vec<u8>,
}

#[async_trait]
pub trait EndpointInterface: Send + Sync {
	/// Identity the endpoint uses when delivering inbound packets.
	fn address(&self) -> Address;

	/// Chain this endpoint lives on.
	fn chain_id(&self) -> ChainId;

	async fn estimate_fees(
		&self,
		destination_chain: ChainId,
		local_address: &Address,
		payload: &[u8],
		use_alt_fee_token: bool,
		adapter_params: &[u8],
	) -> Result<FeeQuote, EndpointError>;

	/// Accepts a packet for best-effort delivery, paying `fee`.
	async fn send(&self, packet: OutboundPacket, fee: Amount) -> Result<(), EndpointError>;
}
