use serde::Serialize;

use crate::models::{Client, Event, TeamMember, Vendor, VendorBooking};

/// Everything the dashboard reads through the cache, loaded in one go.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub clients: Vec<Client>,
    pub events: Vec<Event>,
    pub team: Vec<TeamMember>,
    pub vendors: Vec<Vendor>,
    pub vendor_bookings: Vec<VendorBooking>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
            && self.events.is_empty()
            && self.team.is_empty()
            && self.vendors.is_empty()
            && self.vendor_bookings.is_empty()
    }

    pub fn client(&self, id: i64) -> Option<&Client> {
        self.clients.iter().find(|c| c.meta.id == Some(id))
    }

    pub fn vendor(&self, id: i64) -> Option<&Vendor> {
        self.vendors.iter().find(|v| v.meta.id == Some(id))
    }

    /// The client's current name, falling back to the name copied onto the
    /// event when it was written (e.g. the client has since been deleted).
    pub fn resolve_client_name<'a>(&'a self, event: &'a Event) -> &'a str {
        self.client(event.client_id)
            .map(|c| c.name.as_str())
            .unwrap_or(&event.client_name)
    }

    pub fn events_for_client(&self, client_id: i64) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.client_id == client_id)
            .collect()
    }

    pub fn bookings_for_client(&self, client_id: i64) -> Vec<&VendorBooking> {
        self.vendor_bookings
            .iter()
            .filter(|b| b.client_id == client_id)
            .collect()
    }
}
