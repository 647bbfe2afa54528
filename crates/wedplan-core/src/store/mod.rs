//! Embedded object store.
//!
//! A small database of named collections holding JSON records. Keys are
//! auto-incrementing integers written into each record's `id` field, and
//! each collection may declare equality indexes over record fields.
//!
//! `Database` keeps everything in memory and, when opened on a directory,
//! mirrors every collection to `<dir>/<collection>.json`.

pub mod database;
pub mod schema;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StorageError;

pub use database::Database;
pub use schema::{CollectionSpec, IndexSpec, Schema};

/// Field holding the primary key inside every stored record
pub const KEY_PATH: &str = "id";

/// Raw record operations of a storage engine.
///
/// The storage gateway talks to the engine only through this trait, so tests
/// can swap in stores that count, delay or fail calls.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StorageError>;

    async fn get(&self, collection: &str, key: i64) -> Result<Option<Value>, StorageError>;

    /// Insert a record under the next generated key and return that key.
    async fn add(&self, collection: &str, record: Value) -> Result<i64, StorageError>;

    /// Insert or replace the record stored under its own `id`.
    async fn put(&self, collection: &str, record: Value) -> Result<i64, StorageError>;

    /// Remove a record. Removing a missing key is not an error.
    async fn delete(&self, collection: &str, key: i64) -> Result<(), StorageError>;

    /// Records whose indexed field equals `query`, in key order.
    async fn get_all_by_index(
        &self,
        collection: &str,
        index: &str,
        query: &Value,
    ) -> Result<Vec<Value>, StorageError>;
}
