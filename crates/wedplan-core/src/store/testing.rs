//! Store doubles shared by the gateway and cache tests.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{Database, ObjectStore};
use crate::error::StorageError;
use crate::models::Collection;

/// In-memory dashboard database that counts reads and can be told to fail
/// or stall.
pub(crate) struct ProbeStore {
    inner: Database,
    get_all_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    read_delay_ms: AtomicU64,
}

impl ProbeStore {
    pub(crate) fn new() -> Self {
        Self {
            inner: Database::in_memory(&Collection::schema()),
            get_all_calls: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            read_delay_ms: AtomicU64::new(0),
        }
    }

    pub(crate) fn get_all_calls(&self) -> usize {
        self.get_all_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn delay_reads(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn write_guard(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("disk full")));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for ProbeStore {
    async fn get_all(&self, collection: &str) -> Result<Vec<Value>, StorageError> {
        self.get_all_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::other("read failed")));
        }
        self.inner.get_all(collection).await
    }

    async fn get(&self, collection: &str, key: i64) -> Result<Option<Value>, StorageError> {
        self.inner.get(collection, key).await
    }

    async fn add(&self, collection: &str, record: Value) -> Result<i64, StorageError> {
        self.write_guard()?;
        self.inner.add(collection, record).await
    }

    async fn put(&self, collection: &str, record: Value) -> Result<i64, StorageError> {
        self.write_guard()?;
        self.inner.put(collection, record).await
    }

    async fn delete(&self, collection: &str, key: i64) -> Result<(), StorageError> {
        self.write_guard()?;
        self.inner.delete(collection, key).await
    }

    async fn get_all_by_index(
        &self,
        collection: &str,
        index: &str,
        query: &Value,
    ) -> Result<Vec<Value>, StorageError> {
        self.inner.get_all_by_index(collection, index, query).await
    }
}
