//! Serde helpers for token amounts in configuration files and API payloads.

use serde::{de, Deserialize, Deserializer, Serializer};
use crate::Amount;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
	Integer(i64),
	Text(String),
}

/// Token amounts may be written as TOML integers or, when they do not fit
/// in an i64, as decimal strings (underscores allowed).
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
	D: Deserializer<'de>,
{
	match RawAmount::deserialize(deserializer)? {
		RawAmount::Integer(value) => u128::try_from(value)
			.map_err(|_| de::Error::custom(format!("Negative amount: {}", value))),
		RawAmount::Text(text) => text
			.trim()
			.replace('_', "")
			.parse::<Amount>()
			.map_err(|_| de::Error::custom(format!("Invalid amount: {}", text))),
	}
}

/// Amounts are written back as decimal strings so they survive a round trip.
pub fn serialize_amount<S>(amount: &Amount, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&amount.to_string())
}
