//! Capability for privileged market operations.

use std::sync::Arc;

/// Identity shared between one market and its admin token.
#[derive(Debug)]
pub(crate) struct MarketKey;

/// Proof of administrative rights over one market instance.
///
/// Minted exactly once, by the builder, alongside the market it governs. It
/// cannot be cloned or constructed elsewhere.
#[derive(Debug)]
pub struct AdminToken {
	key: Arc<MarketKey>,
}

impl AdminToken {
	/// Mints a token and the key the market keeps to recognize it.
	pub(crate) fn mint() -> (Self, Arc<MarketKey>) {
		let key = Arc::new(MarketKey);
		(Self { key: key.clone() }, key)
	}

	pub(crate) fn governs(&self, key: &Arc<MarketKey>) -> bool {
		Arc::ptr_eq(&self.key, key)
	}
}
