use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::record::{impl_record, Collection, RecordMeta};
use super::Client;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventStatus::Pending => write!(f, "Pending"),
            EventStatus::Confirmed => write!(f, "Confirmed"),
            EventStatus::Completed => write!(f, "Completed"),
            EventStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub client_id: i64,
    /// Copied from the client when the event is written; not kept in sync.
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub title: String,
    /// YYYY-MM-DD
    pub date: String,
    /// HH:MM
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl_record!(Event, Collection::Events);

impl Event {
    /// Build an event for a stored client, copying its name.
    pub fn for_client(client: &Client, date: impl Into<String>) -> Self {
        Self {
            client_id: client.meta.id.unwrap_or_default(),
            client_name: client.name.clone(),
            title: format!("{} - {}", client.event_type, client.name),
            date: date.into(),
            location: client.location.clone(),
            services: client.services.clone(),
            ..Default::default()
        }
    }

    pub fn parsed_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()
    }

    /// Not cancelled and dated on or after `today`
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status != EventStatus::Cancelled
            && self.parsed_date().map(|d| d >= today).unwrap_or(false)
    }
}
