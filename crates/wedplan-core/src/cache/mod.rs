//! In-memory data cache in front of the storage gateway.
//!
//! This module provides the `DataProvider`, which keeps one snapshot of the
//! collections the dashboard reads all the time and serves it until it
//! expires, is marked stale, or a mutation goes through. A snapshot is
//! considered fresh for 5 minutes by default.
//!
//! Cached collections:
//! - Clients, Events
//! - Team members
//! - Vendors, Vendor bookings
//!
//! Attendance and finances are read straight from the gateway.

pub mod entry;
pub mod provider;
pub mod snapshot;

pub use entry::CachedData;
pub use provider::{CacheSettings, CacheStatus, DataProvider, ProviderState};
pub use snapshot::Snapshot;
