//! In-process messaging endpoint.
//!
//! Accepted packets are queued in send order. Whoever drives the system
//! (tests, the service) drains the queue and hands the packets to the peer
//! gateway, which lets delivery be delayed, reordered or dropped at will.

use crate::{EndpointError, EndpointInterface, FeeQuote, OutboundPacket};
use async_trait::async_trait;
use solver_types::{
	parse_amount, Address, Amount, ChainId, ConfigSchema, Field, FieldType, Schema,
	ValidationError,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Packet accepted by the loopback endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentPacket {
	pub source_chain: ChainId,
	pub packet: OutboundPacket,
	pub fee_paid: Amount,
}

pub struct LoopbackEndpoint {
	address: Address,
	chain_id: ChainId,
	base_fee: Amount,
	fee_per_byte: Amount,
	outbox: Mutex<Vec<SentPacket>>,
	reject_sends: AtomicBool,
}

impl LoopbackEndpoint {
	pub fn new(address: Address, chain_id: ChainId) -> Self {
		Self {
			address,
			chain_id,
			base_fee: 0,
			fee_per_byte: 0,
			outbox: Mutex::new(Vec::new()),
			reject_sends: AtomicBool::new(false),
		}
	}

	pub fn with_fees(mut self, base_fee: Amount, fee_per_byte: Amount) -> Self {
		self.base_fee = base_fee;
		self.fee_per_byte = fee_per_byte;
		self
	}

	/// Makes every subsequent `send` fail until switched back.
	pub fn set_reject_sends(&self, reject: bool) {
		self.reject_sends.store(reject, Ordering::SeqCst);
	}

	/// Removes and returns every queued packet in send order.
	pub async fn drain(&self) -> Vec<SentPacket> {
		std::mem::take(&mut *self.outbox.lock().await)
	}

	pub async fn pending(&self) -> usize {
		self.outbox.lock().await.len()
	}

	fn quote(&self, payload_len: usize) -> Amount {
		self.base_fee
			.saturating_add(self.fee_per_byte.saturating_mul(payload_len as Amount))
	}
}

#[async_trait]
impl EndpointInterface for LoopbackEndpoint {
	fn address(&self) -> Address {
		self.address
	}

	fn chain_id(&self) -> ChainId {
		self.chain_id
	}

	async fn estimate_fees(
		&self,
		_destination_chain: ChainId,
		_local_address: &Address,
		payload: &[u8],
		use_alt_fee_token: bool,
		_adapter_params: &[u8],
	) -> Result<FeeQuote, EndpointError> {
		let fee = self.quote(payload.len());
		Ok(if use_alt_fee_token {
			FeeQuote {
				native_fee: 0,
				alt_fee: fee,
			}
		} else {
			FeeQuote {
				native_fee: fee,
				alt_fee: 0,
			}
		})
	}

	async fn send(&self, packet: OutboundPacket, fee: Amount) -> Result<(), EndpointError> {
		if self.reject_sends.load(Ordering::SeqCst) {
			return Err(EndpointError::Rejected("endpoint offline".to_string()));
		}

		let required = self.quote(packet.payload.len());
		if fee < required {
			return Err(EndpointError::InsufficientFee {
				paid: fee,
				required,
			});
		}

		debug!(
			destination_chain = packet.destination_chain,
			bytes = packet.payload.len(),
			fee,
			"loopback packet queued"
		);

		self.outbox.lock().await.push(SentPacket {
			source_chain: self.chain_id,
			packet,
			fee_paid: fee,
		});
		Ok(())
	}
}

/// Configuration schema for LoopbackEndpoint.
pub struct LoopbackEndpointSchema;

impl ConfigSchema for LoopbackEndpointSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			// Required fields
			vec![Field::new("endpoint_address", FieldType::Address)],
			// Optional fields
			vec![
				Field::new("base_fee", FieldType::Amount),
				Field::new("fee_per_byte", FieldType::Amount),
			],
		);

		schema.validate(config)
	}
}

/// Factory function to create a loopback endpoint from configuration.
///
/// Configuration parameters:
/// - `endpoint_address`: identity used for inbound deliveries
/// - `base_fee`: flat fee per packet (default: 0)
/// - `fee_per_byte`: fee per payload byte (default: 0)
pub fn create_endpoint(
	config: &toml::Value,
	chain_id: ChainId,
) -> Result<Arc<LoopbackEndpoint>, EndpointError> {
	LoopbackEndpointSchema
		.validate(config)
		.map_err(|e| EndpointError::Backend(e.to_string()))?;

	let address = config
		.get("endpoint_address")
		.and_then(|v| v.as_str())
		.and_then(|s| s.parse::<Address>().ok())
		.ok_or_else(|| EndpointError::Backend("endpoint_address is required".to_string()))?;
	let base_fee = config.get("base_fee").and_then(parse_amount).unwrap_or(0);
	let fee_per_byte = config
		.get("fee_per_byte")
		.and_then(parse_amount)
		.unwrap_or(0);

	Ok(Arc::new(
		LoopbackEndpoint::new(address, chain_id).with_fees(base_fee, fee_per_byte),
	))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn packet(payload: &[u8]) -> OutboundPacket {
		OutboundPacket {
			destination_chain: 30110,
			destination_path: vec![0xaa; 40],
			sender: Address::repeat_byte(0x01),
			payload: payload.to_vec(),
			refund_address: Address::repeat_byte(0x01),
			alt_fee_token: None,
			adapter_params: Vec::new(),
		}
	}

	#[tokio::test]
	async fn test_fee_quote_and_send() {
		let endpoint = LoopbackEndpoint::new(Address::repeat_byte(0xee), 30101).with_fees(100, 2);
		let quote = endpoint
			.estimate_fees(30110, &Address::repeat_byte(0x01), b"abcd", false, &[])
			.await
			.unwrap();
		assert_eq!(quote.native_fee, 108);
		assert_eq!(quote.alt_fee, 0);

		let err = endpoint.send(packet(b"abcd"), 107).await.unwrap_err();
		assert_eq!(
			err,
			EndpointError::InsufficientFee {
				paid: 107,
				required: 108
			}
		);

		endpoint.send(packet(b"abcd"), 108).await.unwrap();
		let sent = endpoint.drain().await;
		assert_eq!(sent.len(), 1);
		assert_eq!(sent[0].source_chain, 30101);
		assert_eq!(endpoint.pending().await, 0);
	}

	#[tokio::test]
	async fn test_rejecting_endpoint() {
		let endpoint = LoopbackEndpoint::new(Address::repeat_byte(0xee), 30101);
		endpoint.set_reject_sends(true);
		assert!(matches!(
			endpoint.send(packet(b"x"), 0).await,
			Err(EndpointError::Rejected(_))
		));
		assert_eq!(endpoint.pending().await, 0);
	}

	#[test]
	fn test_create_endpoint_from_config() {
		let config = toml::Value::Table(
			toml::from_str(
				r#"
				endpoint_address = "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
				base_fee = 1000
				"#,
			)
			.unwrap(),
		);
		let endpoint = create_endpoint(&config, 30101).unwrap();
		assert_eq!(endpoint.address(), Address::repeat_byte(0xee));
		assert_eq!(endpoint.quote(10), 1000);
	}
}
