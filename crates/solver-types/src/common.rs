//! Common types used throughout the solver market.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Chain identifier in the messaging endpoint's numbering.
pub type ChainId = u32;

/// Timestamp (Unix seconds)
pub type Timestamp = u64;

/// Token amount in base units.
pub type Amount = u128;

/// Sequential intent identifier.
pub type IntentId = u64;

/// Token references are plain addresses of the token contract.
pub type TokenId = Address;

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Lowest reputation an eligible solver may hold; also the baseline on first stake.
pub const MIN_REPUTATION: u64 = 50;

/// Reputation ceiling.
pub const MAX_REPUTATION: u64 = 1000;

/// Length of one reputation decay period.
pub const DECAY_PERIOD: u64 = 30 * SECONDS_PER_DAY;

/// Percentage of reputation lost per elapsed decay period.
pub const DECAY_RATE_PERCENT: u64 = 5;

/// Longest lifetime an intent may be created with.
pub const MAX_INTENT_LIFETIME: u64 = 7 * SECONDS_PER_DAY;

/// Errors produced when parsing hex-encoded identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHexError {
	#[error("Invalid hex: {0}")]
	InvalidHex(String),
	#[error("Expected {expected} bytes, got {actual}")]
	InvalidLength { expected: usize, actual: usize },
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], ParseHexError> {
	let raw = s.strip_prefix("0x").unwrap_or(s);
	let bytes = hex::decode(raw).map_err(|e| ParseHexError::InvalidHex(e.to_string()))?;
	if bytes.len() != N {
		return Err(ParseHexError::InvalidLength {
			expected: N,
			actual: bytes.len(),
		});
	}
	let mut out = [0u8; N];
	out.copy_from_slice(&bytes);
	Ok(out)
}

/// 20-byte account or contract address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address(pub [u8; 20]);

impl Address {
	pub const ZERO: Address = Address([0u8; 20]);

	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// Builds an address with every byte set to `byte`.
	pub fn repeat_byte(byte: u8) -> Self {
		Address([byte; 20])
	}

	pub fn is_zero(&self) -> bool {
		self.0 == [0u8; 20]
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl fmt::Debug for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Address({})", self)
	}
}

impl FromStr for Address {
	type Err = ParseHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		decode_fixed::<20>(s).map(Address)
	}
}

impl Serialize for Address {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Address {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(de::Error::custom)
	}
}

/// Opaque 32-byte hash (commitments, message digests).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl fmt::Display for Hash32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "0x{}", hex::encode(self.0))
	}
}

impl fmt::Debug for Hash32 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Hash32({})", self)
	}
}

impl FromStr for Hash32 {
	type Err = ParseHexError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		decode_fixed::<32>(s).map(Hash32)
	}
}

impl Serialize for Hash32 {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&self.to_string())
	}
}

impl<'de> Deserialize<'de> for Hash32 {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		let s = String::deserialize(deserializer)?;
		s.parse().map_err(de::Error::custom)
	}
}

/// Keccak-256 digest of `data`.
pub fn keccak256(data: impl AsRef<[u8]>) -> Hash32 {
	let mut hasher = Keccak256::new();
	hasher.update(data.as_ref());
	Hash32(hasher.finalize().into())
}
