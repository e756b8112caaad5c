mod common;

use common::*;
use solver_types::{remote_path, GatewayEvent, IntentId, MarketError, MarketEvent};

/// Fulfills intent 1 on `source` and returns the packet bytes the endpoint
/// would deliver to `destination`.
async fn settle_and_capture(source: &Node, destination: &Node) -> (Vec<u8>, Vec<u8>) {
	source.stake(solver_one(), 100).await;
	let intent_id = source.open_intent().await;
	source
		.market
		.fulfill(fulfillment(intent_id, solver_one(), 950))
		.await
		.unwrap();

	let mut sent = source.endpoint.drain().await;
	assert_eq!(sent.len(), 1);
	let delivery = sent.remove(0);
	assert_eq!(delivery.source_chain, source.site.chain_id);
	assert_eq!(delivery.packet.destination_chain, destination.site.chain_id);
	assert_eq!(
		delivery.packet.destination_path,
		remote_path(&destination.site.gateway, &source.site.gateway)
	);

	let source_path = remote_path(&delivery.packet.sender, &destination.site.gateway);
	(source_path, delivery.packet.payload)
}

/// Mirrors intent 1 on the destination so the confirmation has a local match.
async fn mirror_intent(destination: &Node) -> IntentId {
	destination.open_intent().await
}

#[tokio::test]
async fn test_confirmation_delivered_between_markets() {
	let a = Node::new(SITE_A, SITE_B);
	let b = Node::new(SITE_B, SITE_A);
	let mirrored = mirror_intent(&b).await;
	let (path, payload) = settle_and_capture(&a, &b).await;
	let mut rx = b.market.subscribe();

	let message = b
		.market
		.receive(SITE_B.endpoint, CHAIN_A, &path, &payload)
		.await
		.unwrap();
	assert_eq!(message.intent_id, mirrored);
	assert_eq!(message.owner, owner());
	assert_eq!(message.amount_out, 950);
	assert_eq!(message.source_chain, CHAIN_A);
	assert!(message.success);

	let completion = b.market.completion(mirrored).await.unwrap();
	assert_eq!(completion.source_chain, CHAIN_A);
	assert_eq!(completion.amount_out, 950);
	assert_eq!(completion.received_at, T0);
	assert_eq!(
		rx.try_recv().unwrap(),
		MarketEvent::Gateway(GatewayEvent::CrossChainSwapCompleted {
			intent_id: mirrored,
			owner: owner(),
			amount_out: 950,
			source_chain: CHAIN_A,
		})
	);

	// Redelivery is accepted and leaves no trace
	b.clock.advance(10);
	assert!(b
		.market
		.receive(SITE_B.endpoint, CHAIN_A, &path, &payload)
		.await
		.is_ok());
	assert!(rx.try_recv().is_err());
	assert_eq!(b.market.completion(mirrored).await.unwrap().received_at, T0);
}

#[tokio::test]
async fn test_receive_rejects_unauthenticated_deliveries() {
	let a = Node::new(SITE_A, SITE_B);
	let b = Node::new(SITE_B, SITE_A);
	mirror_intent(&b).await;
	let (path, payload) = settle_and_capture(&a, &b).await;
	let mut rx = b.market.subscribe();

	assert_eq!(
		b.market
			.receive(addr(0x99), CHAIN_A, &path, &payload)
			.await,
		Err(MarketError::Unauthorized)
	);

	let forged = remote_path(&addr(0x66), &SITE_B.gateway);
	assert_eq!(
		b.market
			.receive(SITE_B.endpoint, CHAIN_A, &forged, &payload)
			.await,
		Err(MarketError::UntrustedRemote { chain_id: CHAIN_A })
	);
	assert_eq!(
		b.market
			.receive(SITE_B.endpoint, 40_000, &path, &payload)
			.await,
		Err(MarketError::UntrustedRemote { chain_id: 40_000 })
	);

	assert!(matches!(
		b.market
			.receive(SITE_B.endpoint, CHAIN_A, &path, b"\x00\x01")
			.await,
		Err(MarketError::MalformedPayload(_))
	));

	assert!(rx.try_recv().is_err());
	assert!(b.market.completion(1).await.is_none());
}

#[tokio::test]
async fn test_receive_checks_local_intent() {
	let a = Node::new(SITE_A, SITE_B);
	let b = Node::new(SITE_B, SITE_A);
	let (path, payload) = settle_and_capture(&a, &b).await;

	// Nothing recorded locally under that id yet
	assert_eq!(
		b.market
			.receive(SITE_B.endpoint, CHAIN_A, &path, &payload)
			.await,
		Err(MarketError::UnknownIntent(1))
	);

	let stranger = addr(0xa2);
	b.custody.mint(token_in(), stranger, 1_000);
	let mut request = b.request(T0 + 600);
	request.owner = stranger;
	let intent_id = b.market.create_intent(request).await.unwrap();
	assert_eq!(intent_id, 1);
	assert_eq!(
		b.market
			.receive(SITE_B.endpoint, CHAIN_A, &path, &payload)
			.await,
		Err(MarketError::OwnerMismatch(1))
	);
	assert!(b.market.completion(1).await.is_none());
}

#[tokio::test]
async fn test_trusted_remote_can_be_rotated() {
	let a = Node::new(SITE_A, SITE_B);
	let b = Node::new(SITE_B, SITE_A);
	mirror_intent(&b).await;
	let (path, payload) = settle_and_capture(&a, &b).await;
	assert!(b.market.is_trusted_remote(CHAIN_A, &path).await);

	let rotated = remote_path(&addr(0x30), &SITE_B.gateway);
	b.market
		.set_trusted_remote(&b.admin, CHAIN_A, rotated.clone())
		.await
		.unwrap();
	assert!(!b.market.is_trusted_remote(CHAIN_A, &path).await);
	assert_eq!(
		b.market
			.receive(SITE_B.endpoint, CHAIN_A, &path, &payload)
			.await,
		Err(MarketError::UntrustedRemote { chain_id: CHAIN_A })
	);

	// The same payload arriving over the rotated path is accepted
	assert!(b
		.market
		.receive(SITE_B.endpoint, CHAIN_A, &rotated, &payload)
		.await
		.is_ok());

	assert_eq!(
		b.market
			.set_trusted_remote(&a.admin, CHAIN_A, path)
			.await,
		Err(MarketError::Unauthorized)
	);
}

#[tokio::test]
async fn test_fee_above_budget_blocks_fulfill() {
	let node = Node::with_base_fee(SITE_A, SITE_B, 2_000_000);
	node.stake(solver_one(), 100).await;
	let intent_id = node.open_intent().await;

	assert_eq!(
		node.market
			.fulfill(fulfillment(intent_id, solver_one(), 950))
			.await,
		Err(MarketError::InsufficientFee {
			required: 2_000_000,
			budget: 1_000_000
		})
	);
	assert_eq!(node.custody.balance(&token_out(), &owner()), 0);
	assert_eq!(node.endpoint.pending().await, 0);
}

#[tokio::test]
async fn test_fee_within_budget_is_paid() {
	let node = Node::with_base_fee(SITE_A, SITE_B, 700);
	node.stake(solver_one(), 100).await;
	let intent_id = node.open_intent().await;
	let mut rx = node.market.subscribe();

	node.market
		.fulfill(fulfillment(intent_id, solver_one(), 950))
		.await
		.unwrap();

	let sent = node.endpoint.drain().await;
	assert_eq!(sent[0].fee_paid, 700);
	let mut fee_events = Vec::new();
	while let Ok(event) = rx.try_recv() {
		if let MarketEvent::Gateway(GatewayEvent::CrossChainMessageSent { fee, .. }) = event {
			fee_events.push(fee);
		}
	}
	assert_eq!(fee_events, vec![700]);
}
