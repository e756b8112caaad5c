//! Time sources.
//!
//! Every market operation reads the clock once at its start and evaluates all
//! deadlines and decay against that single value.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::Timestamp;

pub trait Clock: Send + Sync {
	/// Current time in unix seconds.
	fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> Timestamp {
		chrono::Utc::now().timestamp().max(0) as u64
	}
}

/// Settable clock shared between a market and the code driving it.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
	now: Arc<AtomicU64>,
}

impl ManualClock {
	pub fn new(start: Timestamp) -> Self {
		Self {
			now: Arc::new(AtomicU64::new(start)),
		}
	}

	pub fn set(&self, now: Timestamp) {
		self.now.store(now, Ordering::SeqCst);
	}

	pub fn advance(&self, seconds: u64) {
		self.now.fetch_add(seconds, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> Timestamp {
		self.now.load(Ordering::SeqCst)
	}
}
