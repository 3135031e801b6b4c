//! Core error types
//!
//! Storage errors are defined next to the store in `crate::storage::error`
//! and boxed into [`RewriteError`] here.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
	#[error("Storage error: {0}")]
	Storage(#[from] Box<StorageError>),

	#[error("Map type {map_type} is not registered in the pool")]
	UnregisteredMap { map_type: &'static str },

	#[error("Dependency cycle while building map {map_type}")]
	MapCycle { map_type: &'static str },

	#[error("Registry holds an unexpected instance for map type {map_type}")]
	MapTypeMismatch { map_type: &'static str },

	#[error("Cannot build url path for {entity} {id}: {reason}")]
	PathGeneration {
		entity: &'static str,
		id: u64,
		reason: String,
	},
}

impl RewriteError {
	/// Check if this error is a wiring mistake rather than a runtime
	/// condition; configuration errors are fatal to the operation and never
	/// retried
	pub fn is_configuration_error(&self) -> bool {
		matches!(
			self,
			RewriteError::UnregisteredMap { .. }
				| RewriteError::MapCycle { .. }
				| RewriteError::MapTypeMismatch { .. }
		)
	}

	pub fn is_retryable(&self) -> bool {
		match self {
			RewriteError::Storage(storage) => storage.is_retryable(),
			_ => false,
		}
	}

	/// Error category for logging
	pub fn category(&self) -> &'static str {
		match self {
			RewriteError::Storage(_) => "storage",
			RewriteError::UnregisteredMap { .. }
			| RewriteError::MapCycle { .. }
			| RewriteError::MapTypeMismatch { .. } => "configuration",
			RewriteError::PathGeneration { .. } => "path_generation",
		}
	}
}

// Boxed for size optimization, storage errors carry redb payloads
impl From<StorageError> for RewriteError {
	fn from(err: StorageError) -> Self {
		RewriteError::Storage(Box::new(err))
	}
}

pub type Result<T> = std::result::Result<T, RewriteError>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_error_categorization() {
		let unregistered = RewriteError::UnregisteredMap { map_type: "CategoryMap" };
		assert!(unregistered.is_configuration_error());
		assert!(!unregistered.is_retryable());
		assert_eq!(unregistered.category(), "configuration");

		let path = RewriteError::PathGeneration {
			entity: "category",
			id: 3,
			reason: "url key is empty".to_string(),
		};
		assert!(!path.is_configuration_error());
		assert_eq!(path.category(), "path_generation");
	}

	#[test]
	fn test_storage_error_is_boxed() {
		let storage = StorageError::InvalidConfiguration("bad".to_string());
		let err: RewriteError = storage.into();
		assert_eq!(err.category(), "storage");
		assert!(err.to_string().contains("Invalid configuration"));
	}
}
