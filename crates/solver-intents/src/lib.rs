//! Swap intent lifecycle.
//!
//! The ledger owns every intent record and drives creation, fulfillment and
//! expiry. Fulfillment reaches into the registry (through the performance
//! tracker), the bid book and the gateway, which the caller lends for the
//! duration of the call.

pub mod ledger;
mod performance;

pub use ledger::{FulfillContext, Fulfillment, IntentLedger, LedgerParams, LedgerState};
