use serde::{Deserialize, Serialize};

use super::record::{impl_record, Collection, RecordMeta};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Completed,
}

impl std::fmt::Display for ClientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientStatus::Active => write!(f, "Active"),
            ClientStatus::Inactive => write!(f, "Inactive"),
            ClientStatus::Completed => write!(f, "Completed"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    /// e.g. "Pernikahan", "Lamaran"
    #[serde(default)]
    pub event_type: String,
    /// YYYY-MM-DD
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub status: ClientStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl_record!(Client, Collection::Clients);

impl Client {
    pub fn new(name: impl Into<String>, event_type: impl Into<String>, event_date: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            event_type: event_type.into(),
            event_date: event_date.into(),
            ..Default::default()
        }
    }
}
