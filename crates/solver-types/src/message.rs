//! Cross-chain settlement confirmation payloads.

use serde::{Deserialize, Serialize};

use crate::{Address, Amount, ChainId, IntentId, MarketError, TokenId};

/// Confirmation sent to the destination chain after an intent is fulfilled.
///
/// Transient wire payload; never persisted by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossChainMessage {
	pub intent_id: IntentId,
	pub owner: Address,
	pub token_out: TokenId,
	pub amount_out: Amount,
	pub source_chain: ChainId,
	pub success: bool,
}

impl CrossChainMessage {
	pub fn encode(&self) -> Result<Vec<u8>, MarketError> {
		serde_json::to_vec(self).map_err(|e| MarketError::MalformedPayload(e.to_string()))
	}

	pub fn decode(payload: &[u8]) -> Result<Self, MarketError> {
		serde_json::from_slice(payload).map_err(|e| MarketError::MalformedPayload(e.to_string()))
	}
}

/// Trusted path for a remote gateway: remote address followed by the local one.
pub fn remote_path(remote: &Address, local: &Address) -> Vec<u8> {
	let mut path = Vec::with_capacity(40);
	path.extend_from_slice(remote.as_bytes());
	path.extend_from_slice(local.as_bytes());
	path
}
