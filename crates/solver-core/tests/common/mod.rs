#![allow(dead_code)]

use solver_config::{ConfigLoader, MarketConfig};
use solver_core::{AdminToken, Fulfillment, Market, MarketBuilder, NewBid};
use solver_custody::implementations::memory::MemoryLedger;
use solver_custody::CustodyInterface;
use solver_messaging::implementations::loopback::LoopbackEndpoint;
use solver_messaging::EndpointInterface;
use solver_types::{
	keccak256, Address, Amount, ChainId, IntentId, ManualClock, NewIntent, Timestamp, TokenId,
};
use std::sync::Arc;

pub const T0: Timestamp = 1_700_000_000;
pub const CHAIN_A: ChainId = 30101;
pub const CHAIN_B: ChainId = 30110;
pub const SECRET: &[u8] = b"settlement-secret";

pub fn addr(byte: u8) -> Address {
	Address::repeat_byte(byte)
}

pub fn owner() -> Address {
	addr(0xa1)
}

pub fn solver_one() -> Address {
	addr(0x51)
}

pub fn solver_two() -> Address {
	addr(0x52)
}

/// Staked but never put on the fulfillment allowlist.
pub fn outsider() -> Address {
	addr(0x53)
}

pub fn admin_address() -> Address {
	addr(0xad)
}

pub fn vault() -> Address {
	addr(0xcc)
}

pub fn token_in() -> TokenId {
	addr(0x71)
}

pub fn token_out() -> TokenId {
	addr(0x72)
}

pub fn stake_token() -> TokenId {
	addr(0x5a)
}

/// Addresses of one market deployment.
#[derive(Debug, Clone, Copy)]
pub struct Site {
	pub chain_id: ChainId,
	pub gateway: Address,
	pub endpoint: Address,
}

pub const SITE_A: Site = Site {
	chain_id: CHAIN_A,
	gateway: Address([0x10; 20]),
	endpoint: Address([0xe1; 20]),
};

pub const SITE_B: Site = Site {
	chain_id: CHAIN_B,
	gateway: Address([0x20; 20]),
	endpoint: Address([0xe2; 20]),
};

pub fn config_text(local: Site, remote: Site, storage: &str) -> String {
	format!(
		r#"
authorized_solvers = ["{solver_one}", "{solver_two}"]

[market]
name = "market-{local_chain}"
local_chain_id = {local_chain}
local_address = "{local_gateway}"
admin_address = "{admin}"
staking_token = "{stake_token}"
min_stake = 1
max_message_fee = 1000000
large_volume_threshold = 10000
medium_volume_threshold = 1000

[custody]
custody_account = "{vault}"

[messaging]
endpoint_address = "{local_endpoint}"

[storage]
{storage}

[[trusted_remotes]]
chain_id = {remote_chain}
remote_address = "{remote_gateway}"

[[remote_contracts]]
chain_id = {remote_chain}
address = "{remote_gateway}"
"#,
		solver_one = solver_one(),
		solver_two = solver_two(),
		local_chain = local.chain_id,
		local_gateway = local.gateway,
		local_endpoint = local.endpoint,
		admin = admin_address(),
		stake_token = stake_token(),
		vault = vault(),
		storage = storage,
		remote_chain = remote.chain_id,
		remote_gateway = remote.gateway,
	)
}

pub fn load_config(local: Site, remote: Site, storage: &str) -> MarketConfig {
	ConfigLoader::new()
		.with_env_prefix("CORE_TEST_UNSET_")
		.load_from_str(&config_text(local, remote, storage))
		.unwrap()
}

/// One market with handles on its concrete collaborators.
pub struct Node {
	pub site: Site,
	pub market: Market,
	pub admin: AdminToken,
	pub custody: Arc<MemoryLedger>,
	pub endpoint: Arc<LoopbackEndpoint>,
	pub clock: ManualClock,
}

impl Node {
	pub fn new(local: Site, remote: Site) -> Self {
		Self::with_storage(local, remote, r#"backend = "memory""#)
	}

	pub fn with_storage(local: Site, remote: Site, storage: &str) -> Self {
		Self::build(local, remote, storage, 0)
	}

	/// Market whose endpoint charges `base_fee` per packet.
	pub fn with_base_fee(local: Site, remote: Site, base_fee: Amount) -> Self {
		Self::build(local, remote, r#"backend = "memory""#, base_fee)
	}

	fn build(local: Site, remote: Site, storage: &str, base_fee: Amount) -> Self {
		let config = load_config(local, remote, storage);
		let custody = Arc::new(MemoryLedger::new(vault()));
		let endpoint = Arc::new(
			LoopbackEndpoint::new(local.endpoint, local.chain_id).with_fees(base_fee, 0),
		);
		let clock = ManualClock::new(T0);

		let custody_handle = custody.clone();
		let endpoint_handle = endpoint.clone();
		let (market, admin) = MarketBuilder::new(config)
			.with_custody_factory(move |_| Ok(custody_handle.clone() as Arc<dyn CustodyInterface>))
			.with_endpoint_factory(move |_, _| {
				Ok(endpoint_handle.clone() as Arc<dyn EndpointInterface>)
			})
			.with_clock(Arc::new(clock.clone()))
			.build()
			.unwrap();

		custody.mint(token_in(), owner(), 1_000_000);
		custody.mint(token_out(), vault(), 1_000_000);
		for solver in [solver_one(), solver_two(), outsider()] {
			custody.mint(stake_token(), solver, 1_000);
		}

		Self {
			site: local,
			market,
			admin,
			custody,
			endpoint,
			clock,
		}
	}

	pub fn request(&self, deadline: Timestamp) -> NewIntent {
		let remote = if self.site.chain_id == CHAIN_A {
			CHAIN_B
		} else {
			CHAIN_A
		};
		NewIntent {
			owner: owner(),
			token_in: token_in(),
			token_out: token_out(),
			amount_in: 1_000,
			min_amount_out: 900,
			destination_chain: remote,
			deadline,
			commitment: keccak256(SECRET),
		}
	}

	/// Opens an intent with a one hour lifetime.
	pub async fn open_intent(&self) -> IntentId {
		let deadline = self.clock_now() + 3_600;
		self.market.create_intent(self.request(deadline)).await.unwrap()
	}

	pub fn clock_now(&self) -> Timestamp {
		use solver_types::Clock;
		self.clock.now()
	}

	pub async fn stake(&self, solver: Address, amount: Amount) {
		self.market.stake(solver, amount).await.unwrap();
	}

	pub fn bid(&self, solver: Address, intent_id: IntentId, amount_out: Amount) -> NewBid {
		NewBid {
			solver,
			intent_id,
			amount_out,
			gas_estimate: 21_000,
			execution_time: 0,
		}
	}
}

pub fn fulfillment(intent_id: IntentId, solver: Address, amount_out: Amount) -> Fulfillment {
	Fulfillment {
		intent_id,
		solver,
		amount_out,
		proof: SECRET.to_vec(),
	}
}
