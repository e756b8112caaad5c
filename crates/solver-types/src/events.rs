//! Audit events emitted by the solver market.
//!
//! Events produced while an operation runs are collected in memory and only
//! published on the [`EventBus`] once the operation has committed.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{Address, Amount, ChainId, IntentId, TokenId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
	Registry(RegistryEvent),
	Bid(BidEvent),
	Intent(IntentEvent),
	Gateway(GatewayEvent),
	Admin(AdminEvent),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
	SolverStaked {
		solver: Address,
		amount: Amount,
		total_stake: Amount,
	},
	SolverUnstaked {
		solver: Address,
		amount: Amount,
		remaining_stake: Amount,
	},
	ReputationUpdated {
		solver: Address,
		new_reputation: u64,
		delta: i64,
	},
	SwapExecuted {
		solver: Address,
		intent_id: IntentId,
		success: bool,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidEvent {
	BidPlaced {
		intent_id: IntentId,
		index: usize,
		solver: Address,
		amount_out: Amount,
	},
	BidAccepted {
		intent_id: IntentId,
		index: usize,
		solver: Address,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentEvent {
	SwapIntentCreated {
		intent_id: IntentId,
		owner: Address,
		amount_in: Amount,
		destination_chain: ChainId,
	},
	SwapIntentFulfilled {
		intent_id: IntentId,
		solver: Address,
		amount_out: Amount,
	},
	SwapIntentExpired {
		intent_id: IntentId,
		refunded: Amount,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GatewayEvent {
	CrossChainMessageSent {
		intent_id: IntentId,
		destination_chain: ChainId,
		fee: Amount,
	},
	CrossChainSwapCompleted {
		intent_id: IntentId,
		owner: Address,
		amount_out: Amount,
		source_chain: ChainId,
	},
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminEvent {
	TrustedRemoteSet { chain_id: ChainId, path: Vec<u8> },
	RemoteContractSet { chain_id: ChainId, address: Address },
	SolverAuthorized { solver: Address, authorized: bool },
	StakingParametersUpdated { min_stake: Amount },
	EmergencyWithdrawal { token: TokenId, amount: Amount },
}

/// Event bus for broadcasting market events to multiple subscribers.
///
/// Uses tokio's broadcast channel; slow subscribers lose the oldest events
/// once the channel capacity is exceeded.
pub struct EventBus {
	sender: broadcast::Sender<MarketEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<MarketEvent> {
		self.sender.subscribe()
	}

	/// Publishes an event to all current subscribers.
	///
	/// Returns an error if there are no active subscribers, which callers
	/// are free to ignore.
	pub fn publish(
		&self,
		event: MarketEvent,
	) -> Result<(), broadcast::error::SendError<MarketEvent>> {
		self.sender.send(event)?;
		Ok(())
	}

	/// Publishes a batch of committed events in order.
	pub fn publish_all(&self, events: impl IntoIterator<Item = MarketEvent>) {
		for event in events {
			self.publish(event).ok();
		}
	}
}

impl Clone for EventBus {
	fn clone(&self) -> Self {
		Self {
			sender: self.sender.clone(),
		}
	}
}
