use std::time::Duration;

use thiserror::Error;

use crate::models::Collection;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage unavailable - no persistent data directory")]
    Unavailable,

    #[error("Record has no id set")]
    MissingId,

    #[error("Record not found: {collection} #{id}")]
    NotFound { collection: String, id: i64 },

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Unknown index {index} on collection {collection}")]
    UnknownIndex { collection: String, index: String },

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Database {name} is at version {found}, newer than supported version {expected}")]
    VersionDowngrade {
        name: String,
        found: u32,
        expected: u32,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StorageError {
    pub fn not_found(collection: &str, id: i64) -> Self {
        StorageError::NotFound {
            collection: collection.to_string(),
            id,
        }
    }

    pub fn unknown_index(collection: &str, index: &str) -> Self {
        StorageError::UnknownIndex {
            collection: collection.to_string(),
            index: index.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Insert into {0} failed")]
    InsertFailed(Collection),

    #[error("Refresh timed out after {0:?}")]
    Timeout(Duration),
}

impl ProviderError {
    /// True when the failure came from the storage layer being switched off
    /// rather than from a broken read or write.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProviderError::Storage(StorageError::Unavailable))
    }
}
