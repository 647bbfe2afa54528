//! Read-through data provider for the dashboard.
//!
//! `DataProvider` owns the cached `Snapshot` of clients, events, team,
//! vendors and vendor bookings. Consumers read the published
//! `ProviderState` (through `state()` or a `watch` receiver from
//! `subscribe()`), and write through the mutation methods, each of which
//! invalidates the cache and reloads it before returning.
//!
//! Refreshes are not coalesced: overlapping refreshes each hit storage and
//! whichever finishes last decides the published snapshot.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::entry::CachedData;
use super::snapshot::Snapshot;
use crate::config::Config;
use crate::error::ProviderError;
use crate::gateway::{StorageGateway, INVALID_ID};
use crate::models::{Client, Event, Record, TeamMember, Vendor, VendorBooking};

/// Shortest period the staleness timer will run at
const MIN_STALE_CHECK: Duration = Duration::from_secs(1);

/// Timing knobs for the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// How long a snapshot is served without going back to storage
    pub validity: Duration,
    /// Upper bound for loading all five collections
    pub fetch_timeout: Duration,
    /// Period of the background timer that marks the cache stale
    pub stale_check_interval: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Config::default().cache_settings()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CacheStatus {
    /// No usable snapshot, or it must be reloaded
    #[default]
    Stale,
    Loading,
    Fresh,
    /// The last refresh failed; the snapshot is the last good one
    Error,
}

/// What consumers see. Cloning is cheap.
#[derive(Debug, Clone, Default)]
pub struct ProviderState {
    pub snapshot: Arc<Snapshot>,
    pub status: CacheStatus,
    pub error: Option<Arc<ProviderError>>,
    pub cached_at: Option<DateTime<Utc>>,
}

pub struct DataProvider {
    gateway: Arc<StorageGateway>,
    settings: CacheSettings,
    cache: Mutex<Option<CachedData<Snapshot>>>,
    state_tx: watch::Sender<ProviderState>,
}

impl DataProvider {
    pub fn new(gateway: Arc<StorageGateway>, settings: CacheSettings) -> Self {
        let (state_tx, _) = watch::channel(ProviderState::default());
        Self {
            gateway,
            settings,
            cache: Mutex::new(None),
            state_tx,
        }
    }

    pub fn gateway(&self) -> &Arc<StorageGateway> {
        &self.gateway
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    /// Current published state
    pub fn state(&self) -> ProviderState {
        self.state_tx.borrow().clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.state_tx.borrow().snapshot)
    }

    /// Receiver that wakes on every published state change
    pub fn subscribe(&self) -> watch::Receiver<ProviderState> {
        self.state_tx.subscribe()
    }

    /// Human-readable age of the cached snapshot, if there is one
    pub async fn cache_age(&self) -> Option<String> {
        self.cache.lock().await.as_ref().map(|c| c.age_display())
    }

    // =========================================================================
    // Refresh
    // =========================================================================

    /// Return the current snapshot, loading it from storage unless a fresh
    /// one is cached and `force` is false.
    ///
    /// Failures never escape: they are published as `CacheStatus::Error`
    /// with the error value, and the last good snapshot is returned.
    pub async fn refresh(&self, force: bool) -> Arc<Snapshot> {
        if !force {
            let cache = self.cache.lock().await;
            if let Some(entry) = cache.as_ref() {
                if entry.is_fresh(self.settings.validity) {
                    debug!("Serving cached snapshot");
                    return Arc::clone(&entry.data);
                }
            }
        }

        self.state_tx.send_modify(|s| s.status = CacheStatus::Loading);
        debug!(force, "Refreshing snapshot");

        let result = tokio::time::timeout(self.settings.fetch_timeout, self.fetch_snapshot()).await;
        match result {
            Ok(Ok(snapshot)) => self.store_snapshot(snapshot).await,
            Ok(Err(e)) => self.record_failure(e).await,
            Err(_) => {
                self.record_failure(ProviderError::Timeout(self.settings.fetch_timeout))
                    .await
            }
        }
    }

    /// Load all five collections concurrently; any failure fails the lot.
    async fn fetch_snapshot(&self) -> Result<Snapshot, ProviderError> {
        let gw = &self.gateway;
        let (clients, events, team, vendors, vendor_bookings) = futures::try_join!(
            gw.get_all::<Client>(),
            gw.get_all::<Event>(),
            gw.get_all::<TeamMember>(),
            gw.get_all::<Vendor>(),
            gw.get_all::<VendorBooking>(),
        )?;

        Ok(Snapshot {
            clients,
            events,
            team,
            vendors,
            vendor_bookings,
        })
    }

    async fn store_snapshot(&self, fresh: Snapshot) -> Arc<Snapshot> {
        let mut cache = self.cache.lock().await;

        let snapshot = match cache.as_ref() {
            Some(entry) if *entry.data == fresh => {
                debug!("Snapshot unchanged");
                Arc::clone(&entry.data)
            }
            _ => Arc::new(fresh),
        };

        let entry = CachedData::new(Arc::clone(&snapshot));
        let cached_at = entry.cached_at;
        *cache = Some(entry);
        drop(cache);

        info!(
            clients = snapshot.clients.len(),
            events = snapshot.events.len(),
            team = snapshot.team.len(),
            vendors = snapshot.vendors.len(),
            bookings = snapshot.vendor_bookings.len(),
            "Snapshot refreshed"
        );

        let published = Arc::clone(&snapshot);
        self.state_tx.send_modify(move |s| {
            if !Arc::ptr_eq(&s.snapshot, &published) {
                s.snapshot = published;
            }
            s.status = CacheStatus::Fresh;
            s.error = None;
            s.cached_at = Some(cached_at);
        });
        snapshot
    }

    async fn record_failure(&self, error: ProviderError) -> Arc<Snapshot> {
        warn!(error = %error, "Snapshot refresh failed");

        // A failed load must not leave the old snapshot looking fresh
        if let Some(entry) = self.cache.lock().await.as_mut() {
            entry.mark_stale();
        }

        let error = Arc::new(error);
        self.state_tx.send_modify(|s| {
            s.status = CacheStatus::Error;
            s.error = Some(error);
        });
        self.snapshot()
    }

    /// Keep the snapshot but make the next `refresh` reload it.
    pub async fn mark_stale(&self) {
        if let Some(entry) = self.cache.lock().await.as_mut() {
            entry.mark_stale();
        }
        self.state_tx.send_if_modified(|s| {
            if s.status == CacheStatus::Fresh {
                s.status = CacheStatus::Stale;
                true
            } else {
                false
            }
        });
    }

    /// Drop the cached snapshot entirely, e.g. on sign-out.
    pub async fn clear(&self) {
        *self.cache.lock().await = None;
        self.state_tx.send_replace(ProviderState::default());
        info!("Data cache cleared");
    }

    /// Spawn the timer that periodically marks the cache stale. The task
    /// ends on its own once the provider is dropped.
    pub fn spawn_staleness_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let provider = Arc::downgrade(self);
        let period = self.settings.stale_check_interval.max(MIN_STALE_CHECK);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let Some(provider) = provider.upgrade() else {
                    debug!("Provider dropped, stopping staleness timer");
                    break;
                };
                provider.mark_stale().await;
            }
        })
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    pub async fn add_client(&self, client: Client) -> Result<i64, ProviderError> {
        self.insert(client).await
    }

    pub async fn add_team_member(&self, member: TeamMember) -> Result<i64, ProviderError> {
        self.insert(member).await
    }

    pub async fn add_vendor(&self, vendor: Vendor) -> Result<i64, ProviderError> {
        self.insert(vendor).await
    }

    /// The event's `client_name` is stored as given; see `Event::for_client`.
    pub async fn add_event(&self, event: Event) -> Result<i64, ProviderError> {
        self.insert(event).await
    }

    pub async fn add_vendor_booking(&self, booking: VendorBooking) -> Result<i64, ProviderError> {
        self.insert(booking).await
    }

    pub async fn update_client(&self, client: Client) -> Result<i64, ProviderError> {
        self.replace(client).await
    }

    pub async fn update_event(&self, event: Event) -> Result<i64, ProviderError> {
        self.replace(event).await
    }

    pub async fn update_vendor_booking(&self, booking: VendorBooking) -> Result<i64, ProviderError> {
        self.replace(booking).await
    }

    /// Events and bookings that reference the client are left in place.
    pub async fn delete_client(&self, id: i64) -> Result<(), ProviderError> {
        self.remove::<Client>(id).await
    }

    pub async fn delete_team_member(&self, id: i64) -> Result<(), ProviderError> {
        self.remove::<TeamMember>(id).await
    }

    pub async fn delete_vendor(&self, id: i64) -> Result<(), ProviderError> {
        self.remove::<Vendor>(id).await
    }

    pub async fn delete_event(&self, id: i64) -> Result<(), ProviderError> {
        self.remove::<Event>(id).await
    }

    pub async fn delete_vendor_booking(&self, id: i64) -> Result<(), ProviderError> {
        self.remove::<VendorBooking>(id).await
    }

    async fn insert<R: Record>(&self, record: R) -> Result<i64, ProviderError> {
        let id = self.gateway.add(record).await;
        if id == INVALID_ID {
            return Err(ProviderError::InsertFailed(R::COLLECTION));
        }
        self.reload().await;
        Ok(id)
    }

    async fn replace<R: Record>(&self, record: R) -> Result<i64, ProviderError> {
        let id = self.gateway.update(record).await?;
        self.reload().await;
        Ok(id)
    }

    async fn remove<R: Record>(&self, id: i64) -> Result<(), ProviderError> {
        self.gateway.delete::<R>(id).await?;
        self.reload().await;
        Ok(())
    }

    async fn reload(&self) {
        self.mark_stale().await;
        self.refresh(true).await;
    }
}
