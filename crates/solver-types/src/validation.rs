//! Configuration validation utilities for collaborator backends.
//!
//! Each backend (custody, verifier, messaging, storage) describes the TOML
//! table it expects as a [`Schema`], and the builder validates the table
//! before constructing the backend.

use thiserror::Error;

use crate::{Address, Hash32};

/// Errors that can occur during configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
	#[error("Missing required field: {0}")]
	MissingField(String),
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	#[error("Type mismatch for field '{field}': expected {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
}

impl ValidationError {
	fn nested(self, parent: &str) -> Self {
		match self {
			ValidationError::MissingField(f) => {
				ValidationError::MissingField(format!("{}.{}", parent, f))
			}
			ValidationError::InvalidValue { field, message } => ValidationError::InvalidValue {
				field: format!("{}.{}", parent, field),
				message,
			},
			ValidationError::TypeMismatch {
				field,
				expected,
				actual,
			} => ValidationError::TypeMismatch {
				field: format!("{}.{}", parent, field),
				expected,
				actual,
			},
		}
	}
}

/// Type of a configuration field.
#[derive(Debug)]
pub enum FieldType {
	String,
	Integer { min: Option<i64>, max: Option<i64> },
	Boolean,
	/// Hex-encoded 20-byte address.
	Address,
	/// Hex-encoded 32-byte hash.
	Hash,
	/// Token amount, given as a decimal string or a non-negative integer.
	Amount,
	Array(Box<FieldType>),
	Table(Schema),
}

/// Type alias for field validator functions.
pub type FieldValidator = Box<dyn Fn(&toml::Value) -> Result<(), String> + Send + Sync>;

/// A field definition with name and type.
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
	pub validator: Option<FieldValidator>,
}

impl std::fmt::Debug for Field {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Field")
			.field("name", &self.name)
			.field("field_type", &self.field_type)
			.field("validator", &self.validator.is_some())
			.finish()
	}
}

impl Field {
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
			validator: None,
		}
	}

	/// Adds a custom validator run after the type check passes.
	pub fn with_validator<F>(mut self, validator: F) -> Self
	where
		F: Fn(&toml::Value) -> Result<(), String> + Send + Sync + 'static,
	{
		self.validator = Some(Box::new(validator));
		self
	}

	fn check(&self, value: &toml::Value) -> Result<(), ValidationError> {
		validate_field_type(&self.name, value, &self.field_type)?;
		if let Some(validator) = &self.validator {
			validator(value).map_err(|message| ValidationError::InvalidValue {
				field: self.name.clone(),
				message,
			})?;
		}
		Ok(())
	}
}

/// Schema definition with required and optional fields.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a TOML value against this schema.
	pub fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let table = config
			.as_table()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "table".to_string(),
				actual: config.type_str().to_string(),
			})?;

		for field in &self.required {
			let value = table
				.get(&field.name)
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			field.check(value)?;
		}

		for field in &self.optional {
			if let Some(value) = table.get(&field.name) {
				field.check(value)?;
			}
		}

		Ok(())
	}
}

fn mismatch(field_name: &str, expected: &str, value: &toml::Value) -> ValidationError {
	ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: value.type_str().to_string(),
	}
}

fn invalid(field_name: &str, message: impl Into<String>) -> ValidationError {
	ValidationError::InvalidValue {
		field: field_name.to_string(),
		message: message.into(),
	}
}

/// Reads a token amount from a TOML value (decimal string or integer).
pub fn parse_amount(value: &toml::Value) -> Option<u128> {
	match value {
		toml::Value::String(s) => s.trim().replace('_', "").parse().ok(),
		toml::Value::Integer(i) if *i >= 0 => Some(*i as u128),
		_ => None,
	}
}

fn validate_field_type(
	field_name: &str,
	value: &toml::Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	match expected_type {
		FieldType::String => {
			if !value.is_str() {
				return Err(mismatch(field_name, "string", value));
			}
		}
		FieldType::Integer { min, max } => {
			let int_val = value
				.as_integer()
				.ok_or_else(|| mismatch(field_name, "integer", value))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(invalid(
						field_name,
						format!("Value {} is less than minimum {}", int_val, min_val),
					));
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(invalid(
						field_name,
						format!("Value {} is greater than maximum {}", int_val, max_val),
					));
				}
			}
		}
		FieldType::Boolean => {
			if !value.is_bool() {
				return Err(mismatch(field_name, "boolean", value));
			}
		}
		FieldType::Address => {
			let s = value
				.as_str()
				.ok_or_else(|| mismatch(field_name, "address string", value))?;
			s.parse::<Address>()
				.map_err(|e| invalid(field_name, e.to_string()))?;
		}
		FieldType::Hash => {
			let s = value
				.as_str()
				.ok_or_else(|| mismatch(field_name, "hash string", value))?;
			s.parse::<Hash32>()
				.map_err(|e| invalid(field_name, e.to_string()))?;
		}
		FieldType::Amount => {
			if !(value.is_str() || value.is_integer()) {
				return Err(mismatch(field_name, "amount", value));
			}
			if parse_amount(value).is_none() {
				return Err(invalid(field_name, "not a non-negative integer amount"));
			}
		}
		FieldType::Array(inner_type) => {
			let array = value
				.as_array()
				.ok_or_else(|| mismatch(field_name, "array", value))?;

			for (i, item) in array.iter().enumerate() {
				validate_field_type(&format!("{}[{}]", field_name, i), item, inner_type)?;
			}
		}
		FieldType::Table(schema) => {
			schema.validate(value).map_err(|e| e.nested(field_name))?;
		}
	}

	Ok(())
}

/// A configuration schema that can validate a backend's TOML table.
pub trait ConfigSchema: Send + Sync {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(raw: &str) -> toml::Value {
		toml::Value::Table(toml::from_str(raw).unwrap())
	}

	fn schema() -> Schema {
		Schema::new(
			vec![Field::new("custody_account", FieldType::Address)],
			vec![
				Field::new("fee", FieldType::Amount),
				Field::new(
					"limits",
					FieldType::Table(Schema::new(
						vec![Field::new(
							"max",
							FieldType::Integer {
								min: Some(1),
								max: None,
							},
						)],
						vec![],
					)),
				),
			],
		)
	}

	#[test]
	fn test_accepts_valid_table() {
		let config = table(
			r#"
			custody_account = "0x00000000000000000000000000000000000000cc"
			fee = "1000000000000000000000"
			[limits]
			max = 3
			"#,
		);
		assert!(schema().validate(&config).is_ok());
	}

	#[test]
	fn test_reports_missing_and_nested_fields() {
		let config = table("fee = 1");
		assert_eq!(
			schema().validate(&config),
			Err(ValidationError::MissingField("custody_account".into()))
		);

		let config = table(
			r#"
			custody_account = "0x00000000000000000000000000000000000000cc"
			[limits]
			max = 0
			"#,
		);
		match schema().validate(&config) {
			Err(ValidationError::InvalidValue { field, .. }) => assert_eq!(field, "limits.max"),
			other => panic!("unexpected result: {:?}", other),
		}
	}

	#[test]
	fn test_rejects_bad_address() {
		let config = table(r#"custody_account = "0x12""#);
		assert!(matches!(
			schema().validate(&config),
			Err(ValidationError::InvalidValue { .. })
		));
	}

	#[test]
	fn test_parse_amount() {
		assert_eq!(parse_amount(&toml::Value::Integer(5)), Some(5));
		assert_eq!(parse_amount(&toml::Value::Integer(-5)), None);
		assert_eq!(
			parse_amount(&toml::Value::String("10_000".into())),
			Some(10_000)
		);
	}
}
