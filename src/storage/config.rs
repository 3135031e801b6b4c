//! Storage configuration

use std::path::PathBuf;

/// Configuration for the redb-backed rewrite store
#[derive(Debug, Clone)]
pub struct StorageConfig {
	/// Path where the database file will be stored
	pub database_path: PathBuf,

	/// Chunk size for bulk save/replace operations
	pub save_chunk_size: usize,

	/// Name prefix of ephemeral derived tables; a unique suffix is
	/// appended per materialization
	pub derived_table_prefix: String,
}

impl StorageConfig {
	/// Custom configuration with the given database path
	pub fn with_path(path: PathBuf) -> Self {
		Self { database_path: path, ..Self::default() }
	}

	/// Validate configuration parameters
	pub fn validate(&self) -> Result<(), String> {
		if self.save_chunk_size == 0 {
			return Err("Save chunk size must be greater than 0".to_string());
		}

		if self.derived_table_prefix.is_empty() {
			return Err("Derived table prefix must not be empty".to_string());
		}

		if self.derived_table_prefix.contains(char::is_whitespace) {
			return Err("Derived table prefix must not contain whitespace".to_string());
		}

		Ok(())
	}
}

impl Default for StorageConfig {
	fn default() -> Self {
		Self {
			database_path: std::env::temp_dir().join("catalog_rewrites.redb"),
			save_chunk_size: 100,
			derived_table_prefix: "url_rewrite_scope_".to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_config_validation() {
		let mut config = StorageConfig::default();
		assert!(config.validate().is_ok());

		config.save_chunk_size = 0;
		assert!(config.validate().is_err());
		config.save_chunk_size = 100;

		config.derived_table_prefix = String::new();
		assert!(config.validate().is_err());
		config.derived_table_prefix = "has space".to_string();
		assert!(config.validate().is_err());
	}

	#[test]
	fn test_custom_path() {
		let custom_path = PathBuf::from("/custom/database/path");
		let config = StorageConfig::with_path(custom_path.clone());
		assert_eq!(config.database_path, custom_path);
		assert_eq!(config.save_chunk_size, 100);
	}
}
