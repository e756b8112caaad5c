//! Persistent key/value storage for market snapshots.
//!
//! Backends store raw bytes under string keys. [`StorageService`] layers
//! typed, JSON-encoded records on top, keyed as `namespace:id`.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use solver_types::{ConfigSchema, MarketError};
use std::sync::Arc;
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
}

impl From<StorageError> for MarketError {
	fn from(err: StorageError) -> Self {
		MarketError::Storage(err.to_string())
	}
}

/// Trait defining the low-level interface for storage backends.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes, replacing any previous value.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Deletes the value associated with the given key. Missing keys are fine.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Typed storage on top of a byte backend.
#[derive(Clone)]
pub struct StorageService {
	backend: Arc<dyn StorageInterface>,
}

impl StorageService {
	pub fn new(backend: Arc<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	fn key(namespace: &str, id: &str) -> String {
		format!("{}:{}", namespace, id)
	}

	/// Stores a serializable value as JSON.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend
			.set_bytes(&Self::key(namespace, id), bytes)
			.await
	}

	/// Retrieves and deserializes a value from storage.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let bytes = self.backend.get_bytes(&Self::key(namespace, id)).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Like [`retrieve`](Self::retrieve) but maps a missing key to `None`.
	pub async fn try_retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Option<T>, StorageError> {
		match self.retrieve(namespace, id).await {
			Ok(value) => Ok(Some(value)),
			Err(StorageError::NotFound) => Ok(None),
			Err(e) => Err(e),
		}
	}

	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		self.backend.exists(&Self::key(namespace, id)).await
	}

	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		self.backend.delete(&Self::key(namespace, id)).await
	}
}

/// Factory function to create a storage backend from configuration.
///
/// Configuration parameters:
/// - `backend`: "file" (default) or "memory"
/// - remaining keys are passed to the chosen backend
pub fn create_storage(config: &toml::Value) -> Result<Arc<dyn StorageInterface>, StorageError> {
	let backend = config
		.get("backend")
		.and_then(|v| v.as_str())
		.unwrap_or("file");

	match backend {
		"file" => {
			implementations::file::FileStorageSchema
				.validate(config)
				.map_err(|e| StorageError::Backend(e.to_string()))?;
			Ok(implementations::file::create_storage(config))
		}
		"memory" => Ok(Arc::new(implementations::memory::MemoryStorage::new())),
		other => Err(StorageError::Backend(format!(
			"unknown storage backend: {}",
			other
		))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, PartialEq, Serialize, Deserialize)]
	struct Counter {
		value: u64,
	}

	#[tokio::test]
	async fn test_typed_roundtrip_and_missing() {
		let service = StorageService::new(Arc::new(implementations::memory::MemoryStorage::new()));
		assert_eq!(
			service.try_retrieve::<Counter>("snapshots", "a").await,
			Ok(None)
		);

		service
			.store("snapshots", "a", &Counter { value: 3 })
			.await
			.unwrap();
		assert!(service.exists("snapshots", "a").await.unwrap());
		assert_eq!(
			service.retrieve::<Counter>("snapshots", "a").await,
			Ok(Counter { value: 3 })
		);

		service.remove("snapshots", "a").await.unwrap();
		assert_eq!(
			service.retrieve::<Counter>("snapshots", "a").await,
			Err(StorageError::NotFound)
		);
	}

	#[tokio::test]
	async fn test_corrupt_value_is_serialization_error() {
		let backend = Arc::new(implementations::memory::MemoryStorage::new());
		backend.set_bytes("snapshots:a", b"{".to_vec()).await.unwrap();
		let service = StorageService::new(backend);
		assert!(matches!(
			service.retrieve::<Counter>("snapshots", "a").await,
			Err(StorageError::Serialization(_))
		));
	}

	#[test]
	fn test_create_storage_backends() {
		let mut table = toml::Table::new();
		table.insert("backend".into(), toml::Value::String("memory".into()));
		assert!(create_storage(&toml::Value::Table(table)).is_ok());

		let mut table = toml::Table::new();
		table.insert("backend".into(), toml::Value::String("redis".into()));
		assert!(create_storage(&toml::Value::Table(table)).is_err());

		let mut table = toml::Table::new();
		table.insert("storage_path".into(), toml::Value::Integer(5));
		assert!(create_storage(&toml::Value::Table(table)).is_err());
	}
}
