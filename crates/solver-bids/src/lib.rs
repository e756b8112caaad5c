//! Per-intent bid collection and best-bid selection.

pub mod book;
pub mod scoring;

pub use book::{BidBook, BidBookState, NewBid};
pub use scoring::score;
