//! Error types for storage operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
	#[error("Storage initialization failed: {0}")]
	InitializationFailed(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] bincode::Error),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Invalid configuration: {0}")]
	InvalidConfiguration(String),

	#[error("Derived table {0} is not materialized")]
	DerivedTableMissing(String),

	#[error("redb database error: {0}")]
	Redb(#[from] redb::Error),

	#[error("redb transaction error: {0}")]
	RedbTransaction(#[from] redb::TransactionError),

	#[error("redb commit error: {0}")]
	RedbCommit(#[from] redb::CommitError),

	#[error("redb table error: {0}")]
	RedbTable(#[from] redb::TableError),

	#[error("redb storage error: {0}")]
	RedbStorage(#[from] redb::StorageError),
}

impl StorageError {
	/// Check if this error indicates that the operation could be retried
	pub fn is_retryable(&self) -> bool {
		matches!(self, StorageError::RedbTransaction(_) | StorageError::Io(_))
	}

	/// Check if this error indicates data corruption
	pub fn is_corruption(&self) -> bool {
		matches!(
			self,
			StorageError::RedbStorage(redb::StorageError::Corrupted(_))
		)
	}
}

impl From<redb::DatabaseError> for StorageError {
	fn from(e: redb::DatabaseError) -> Self {
		StorageError::Redb(redb::Error::from(e))
	}
}

pub type StorageResult<T> = Result<T, StorageError>;
