use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::store::{CollectionSpec, Schema};

/// Database name used on disk
pub const DATABASE_NAME: &str = "wedplan";

/// Current schema version. Version 2 added the `vendorBookings` collection.
pub const DATABASE_VERSION: u32 = 2;

/// Named record collections in the dashboard database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Clients,
    Events,
    Team,
    Vendors,
    Attendance,
    Finances,
    VendorBookings,
}

impl Collection {
    pub const ALL: [Collection; 7] = [
        Collection::Clients,
        Collection::Events,
        Collection::Team,
        Collection::Vendors,
        Collection::Attendance,
        Collection::Finances,
        Collection::VendorBookings,
    ];

    /// Store name as it appears on disk
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Clients => "clients",
            Collection::Events => "events",
            Collection::Team => "team",
            Collection::Vendors => "vendors",
            Collection::Attendance => "attendance",
            Collection::Finances => "finances",
            Collection::VendorBookings => "vendorBookings",
        }
    }

    /// Secondary indexes as (index name, key path) pairs
    pub fn indexes(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Collection::Clients => &[("by-name", "name")],
            Collection::Events => &[("by-date", "date"), ("by-client", "clientId")],
            Collection::Team => &[("by-role", "role")],
            Collection::Vendors => &[("by-category", "category")],
            Collection::Attendance => &[("by-date", "date"), ("by-member", "teamMemberId")],
            Collection::Finances => &[("by-date", "date"), ("by-client", "clientId")],
            Collection::VendorBookings => &[
                ("by-client", "clientId"),
                ("by-vendor", "vendorId"),
                ("by-date", "eventDate"),
            ],
        }
    }

    pub fn spec(&self) -> CollectionSpec {
        self.indexes()
            .iter()
            .fold(CollectionSpec::new(self.name()), |spec, &(name, path)| {
                spec.index(name, path)
            })
    }

    /// Full schema of the dashboard database
    pub fn schema() -> Schema {
        Self::ALL
            .iter()
            .fold(Schema::new(DATABASE_NAME, DATABASE_VERSION), |schema, c| {
                schema.collection(c.spec())
            })
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and timestamps shared by every stored record.
///
/// `id` is assigned by the store on first insert and is never taken from the
/// caller. `created_at` is written once; `updated_at` moves on every write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A record type that lives in one of the named collections.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    fn id(&self) -> Option<i64> {
        self.meta().id
    }
}

macro_rules! impl_record {
    ($ty:ty, $collection:expr) => {
        impl $crate::models::Record for $ty {
            const COLLECTION: $crate::models::Collection = $collection;

            fn meta(&self) -> &$crate::models::RecordMeta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut $crate::models::RecordMeta {
                &mut self.meta
            }
        }
    };
}

pub(crate) use impl_record;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_has_every_collection() {
        let schema = Collection::schema();
        assert_eq!(schema.version, DATABASE_VERSION);
        for collection in Collection::ALL {
            let spec = schema
                .collections
                .iter()
                .find(|c| c.name == collection.name())
                .expect("collection in schema");
            assert_eq!(spec.indexes.len(), collection.indexes().len());
        }
    }

    #[test]
    fn test_booking_indexes() {
        let spec = Collection::VendorBookings.spec();
        let names: Vec<&str> = spec.indexes.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["by-client", "by-vendor", "by-date"]);
        assert_eq!(Collection::VendorBookings.to_string(), "vendorBookings");
    }

    #[test]
    fn test_meta_skips_missing_id() {
        let json = serde_json::to_value(RecordMeta::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }
}
