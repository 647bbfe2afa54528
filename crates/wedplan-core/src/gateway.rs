//! Typed record access over the object store.
//!
//! `StorageGateway` is constructed once at startup and shared behind an
//! `Arc`. When no persistent data directory is available it runs disabled:
//! reads come back empty, `add` returns `INVALID_ID`, and `update`/`delete`
//! fail with `StorageError::Unavailable` so callers can tell "empty" from
//! "broken".

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::StorageError;
use crate::models::{Collection, Record};
use crate::store::{Database, ObjectStore};

/// Returned by `add` when the insert did not happen
pub const INVALID_ID: i64 = -1;

pub struct StorageGateway {
    store: Option<Arc<dyn ObjectStore>>,
}

impl StorageGateway {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A gateway with no storage behind it
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Open the dashboard database in the configured data directory,
    /// falling back to a disabled gateway when that is not possible.
    pub fn open(config: &Config) -> Self {
        let Some(dir) = config.data_dir() else {
            warn!("No data directory available, storage disabled");
            return Self::disabled();
        };

        match Database::open(&dir, &Collection::schema()) {
            Ok(db) => {
                info!(
                    database = db.name(),
                    path = ?db.dir(),
                    version = db.version(),
                    "Database opened"
                );
                Self::new(Arc::new(db))
            }
            Err(e) => {
                error!(path = ?dir, error = %e, "Failed to open database, storage disabled");
                Self::disabled()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    fn store(&self) -> Result<&Arc<dyn ObjectStore>, StorageError> {
        self.store.as_ref().ok_or(StorageError::Unavailable)
    }

    pub async fn get_all<R: Record>(&self) -> Result<Vec<R>, StorageError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(Vec::new());
        };
        let rows = store.get_all(R::COLLECTION.name()).await?;
        decode_all(rows)
    }

    pub async fn get_by_id<R: Record>(&self, id: i64) -> Result<Option<R>, StorageError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };
        match store.get(R::COLLECTION.name(), id).await? {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }

    /// Insert a new record and return its id, or `INVALID_ID` on failure.
    ///
    /// Any id on the record is discarded; both timestamps are set to now.
    pub async fn add<R: Record>(&self, record: R) -> i64 {
        match self.try_add(record).await {
            Ok(id) => id,
            Err(e) => {
                error!(collection = %R::COLLECTION, error = %e, "Failed to add record");
                INVALID_ID
            }
        }
    }

    async fn try_add<R: Record>(&self, mut record: R) -> Result<i64, StorageError> {
        let store = self.store()?;

        let now = Utc::now();
        let meta = record.meta_mut();
        meta.id = None;
        meta.created_at = Some(now);
        meta.updated_at = Some(now);

        let id = store
            .add(R::COLLECTION.name(), serde_json::to_value(&record)?)
            .await?;
        debug!(collection = %R::COLLECTION, id, "Record added");
        Ok(id)
    }

    /// Replace a stored record wholesale.
    ///
    /// The stored `createdAt` is kept whatever the caller's copy says, and
    /// `updatedAt` is set to now.
    pub async fn update<R: Record>(&self, mut record: R) -> Result<i64, StorageError> {
        let store = self.store()?;
        let id = record.id().ok_or(StorageError::MissingId)?;
        let collection = R::COLLECTION.name();

        let existing = store
            .get(collection, id)
            .await?
            .ok_or_else(|| StorageError::not_found(collection, id))?;
        let created_at: Option<DateTime<Utc>> = existing
            .get("createdAt")
            .cloned()
            .map(serde_json::from_value)
            .transpose()?;

        let meta = record.meta_mut();
        meta.created_at = created_at;
        meta.updated_at = Some(Utc::now());

        let id = store.put(collection, serde_json::to_value(&record)?).await?;
        debug!(collection, id, "Record updated");
        Ok(id)
    }

    /// Remove a record. Deleting an id that does not exist succeeds.
    pub async fn delete<R: Record>(&self, id: i64) -> Result<(), StorageError> {
        self.store()?.delete(R::COLLECTION.name(), id).await
    }

    /// Records whose `index` field equals `value`
    pub async fn get_by_index<R: Record>(
        &self,
        index: &str,
        value: impl Serialize,
    ) -> Result<Vec<R>, StorageError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(Vec::new());
        };
        let query = serde_json::to_value(value)?;
        let rows = store
            .get_all_by_index(R::COLLECTION.name(), index, &query)
            .await?;
        decode_all(rows)
    }
}

fn decode_all<R: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<R>, StorageError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(StorageError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Attendance, AttendanceStatus, Client, Event, Finance, FinanceKind, Vendor, VendorBooking,
    };
    use crate::store::testing::ProbeStore;

    fn gateway() -> StorageGateway {
        StorageGateway::new(Arc::new(ProbeStore::new()))
    }

    #[tokio::test]
    async fn test_add_then_get_round_trips() {
        let gw = gateway();
        let client = Client::new("Rina", "Pernikahan", "2025-06-01");

        let id = gw.add(client.clone()).await;
        assert!(id > 0);

        let stored: Client = gw.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.meta.id, Some(id));
        assert!(stored.meta.created_at.is_some());
        assert_eq!(stored.meta.created_at, stored.meta.updated_at);

        let mut expected = client;
        expected.meta = stored.meta.clone();
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_add_ignores_caller_id() {
        let gw = gateway();
        let mut vendor = Vendor {
            name: "Dapur Ibu".to_string(),
            category: "catering".to_string(),
            ..Default::default()
        };
        vendor.meta.id = Some(99);

        let id = gw.add(vendor).await;
        assert_eq!(id, 1);
        assert!(gw.get_by_id::<Vendor>(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_keeps_created_at() {
        let gw = gateway();
        let id = gw.add(Client::new("Rina", "Pernikahan", "2025-06-01")).await;
        let before: Client = gw.get_by_id(id).await.unwrap().unwrap();

        let mut changed = before.clone();
        changed.phone = "0812000111".to_string();
        changed.meta.created_at = Some(Utc::now() + chrono::Duration::days(3));
        gw.update(changed).await.unwrap();

        let after: Client = gw.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(after.phone, "0812000111");
        assert_eq!(after.meta.created_at, before.meta.created_at);
        assert!(after.meta.updated_at >= before.meta.updated_at);
    }

    #[tokio::test]
    async fn test_update_requires_existing_id() {
        let gw = gateway();
        let err = gw.update(Client::new("Rina", "", "")).await.unwrap_err();
        assert!(matches!(err, StorageError::MissingId));

        let mut ghost = Client::new("Ghost", "", "");
        ghost.meta.id = Some(77);
        let err = gw.update(ghost).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { id: 77, .. }));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let gw = gateway();
        let id = gw.add(Client::new("Rina", "Pernikahan", "2025-06-01")).await;

        gw.delete::<Client>(id).await.unwrap();
        assert!(gw.get_by_id::<Client>(id).await.unwrap().is_none());
        gw.delete::<Client>(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_failure_returns_sentinel() {
        let store = Arc::new(ProbeStore::new());
        store.fail_writes(true);
        let gw = StorageGateway::new(store);

        let id = gw.add(Client::new("Rina", "Pernikahan", "2025-06-01")).await;
        assert_eq!(id, INVALID_ID);
    }

    #[tokio::test]
    async fn test_disabled_gateway() {
        let gw = StorageGateway::disabled();
        assert!(!gw.is_available());

        assert!(gw.get_all::<Client>().await.unwrap().is_empty());
        assert!(gw.get_by_id::<Client>(1).await.unwrap().is_none());
        assert!(gw
            .get_by_index::<Event>("by-client", 1)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(gw.add(Client::new("Rina", "", "")).await, INVALID_ID);

        let mut client = Client::new("Rina", "", "");
        client.meta.id = Some(1);
        assert!(matches!(
            gw.update(client).await.unwrap_err(),
            StorageError::Unavailable
        ));
        assert!(matches!(
            gw.delete::<Client>(1).await.unwrap_err(),
            StorageError::Unavailable
        ));
    }

    #[tokio::test]
    async fn test_unknown_index_propagates() {
        let gw = gateway();
        let err = gw
            .get_by_index::<Client>("by-phone", "0812")
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UnknownIndex { .. }));
    }

    #[tokio::test]
    async fn test_event_keeps_client_name_after_rename() {
        let gw = gateway();
        let budi_id = gw.add(Client::new("Budi", "Pernikahan", "2025-01-01")).await;
        let budi: Client = gw.get_by_id(budi_id).await.unwrap().unwrap();

        gw.add(Event::for_client(&budi, "2025-01-01")).await;

        let mut renamed = budi.clone();
        renamed.name = "Budi Santoso".to_string();
        gw.update(renamed).await.unwrap();

        let events: Vec<Event> = gw.get_by_index("by-client", budi_id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].client_name, "Budi");
    }

    fn attendance(member: i64, date: &str, status: AttendanceStatus) -> Attendance {
        Attendance {
            team_member_id: member,
            date: date.to_string(),
            status,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_attendance_indexes() {
        let gw = gateway();
        gw.add(attendance(1, "2025-01-10", AttendanceStatus::Present)).await;
        gw.add(attendance(2, "2025-01-10", AttendanceStatus::Late)).await;
        gw.add(attendance(1, "2025-01-11", AttendanceStatus::Absent)).await;

        let agus: Vec<Attendance> = gw.get_by_index("by-member", 1).await.unwrap();
        assert_eq!(agus.len(), 2);
        assert!(agus.iter().all(|a| a.team_member_id == 1));

        let day: Vec<Attendance> = gw.get_by_index("by-date", "2025-01-10").await.unwrap();
        let members: Vec<i64> = day.iter().map(|a| a.team_member_id).collect();
        assert_eq!(members, vec![1, 2]);
        assert_eq!(day[1].status, AttendanceStatus::Late);

        let nobody: Vec<Attendance> = gw.get_by_index("by-member", 9).await.unwrap();
        assert!(nobody.is_empty());
    }

    #[tokio::test]
    async fn test_finance_without_client_is_not_indexed_by_client() {
        let gw = gateway();
        let invoice = gw
            .add(Finance {
                kind: FinanceKind::Income,
                amount: 10_000_000.0,
                description: "Down payment".to_string(),
                date: "2025-01-10".to_string(),
                client_id: Some(1),
                ..Default::default()
            })
            .await;
        let rent = gw
            .add(Finance {
                kind: FinanceKind::Expense,
                amount: 2_000_000.0,
                description: "Office rent".to_string(),
                date: "2025-01-10".to_string(),
                client_id: None,
                ..Default::default()
            })
            .await;
        assert!(invoice > 0 && rent > 0);

        let for_client: Vec<Finance> = gw.get_by_index("by-client", 1).await.unwrap();
        assert_eq!(for_client.len(), 1);
        assert_eq!(for_client[0].meta.id, Some(invoice));

        let stored_rent: Finance = gw.get_by_id(rent).await.unwrap().unwrap();
        assert_eq!(stored_rent.client_id, None);

        let same_day: Vec<Finance> = gw.get_by_index("by-date", "2025-01-10").await.unwrap();
        assert_eq!(same_day.len(), 2);
    }

    #[tokio::test]
    async fn test_booking_vendor_and_date_indexes() {
        let gw = gateway();
        let bookings = [
            (1, 10, "2025-06-01"),
            (2, 10, "2025-07-12"),
            (2, 11, "2025-07-12"),
        ];
        for (client_id, vendor_id, date) in bookings {
            gw.add(VendorBooking {
                client_id,
                vendor_id,
                event_date: date.to_string(),
                ..Default::default()
            })
            .await;
        }

        let caterer: Vec<VendorBooking> = gw.get_by_index("by-vendor", 10).await.unwrap();
        let clients: Vec<i64> = caterer.iter().map(|b| b.client_id).collect();
        assert_eq!(clients, vec![1, 2]);

        let july: Vec<VendorBooking> = gw.get_by_index("by-date", "2025-07-12").await.unwrap();
        assert_eq!(july.len(), 2);
        assert!(july.iter().all(|b| b.event_date == "2025-07-12"));

        let second: Vec<VendorBooking> = gw.get_by_index("by-client", 2).await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_open_uses_configured_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        };

        let gw = StorageGateway::open(&config);
        assert!(gw.is_available());
        let id = gw.add(Client::new("Rina", "Pernikahan", "2025-06-01")).await;
        assert_eq!(id, 1);
        assert!(dir.path().join("clients.json").exists());
    }
}
