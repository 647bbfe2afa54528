//! Data layer for the wedplan wedding-planning dashboard.
//!
//! - `store`: embedded object store (collections, auto-increment keys, indexes)
//! - `gateway`: typed record access with timestamps and a disabled mode
//! - `cache`: time-expiring snapshot provider that reloads after mutations
//! - `signal`, `local`: refresh flags kept in local key-value storage
//! - `auth`: the signed-in session
//! - `summary`: headline dashboard numbers

pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod local;
pub mod models;
pub mod signal;
pub mod store;
pub mod summary;
pub mod utils;

pub use cache::{CacheSettings, CacheStatus, DataProvider, ProviderState, Snapshot};
pub use config::Config;
pub use error::{ProviderError, StorageError};
pub use gateway::{StorageGateway, INVALID_ID};
