//! Headline numbers for the dashboard landing page.

use std::fmt;

use chrono::NaiveDate;

use crate::cache::Snapshot;
use crate::models::{Event, PaymentStatus};
use crate::utils::format_currency;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardSummary {
    pub clients: usize,
    pub upcoming_events: usize,
    pub active_team: usize,
    pub vendors: usize,
    /// Bookings not yet fully paid
    pub open_bookings: usize,
    /// Total price of bookings not yet fully paid
    pub unsettled_value: f64,
}

impl DashboardSummary {
    pub fn from_snapshot(snapshot: &Snapshot, today: NaiveDate) -> Self {
        let open: Vec<_> = snapshot
            .vendor_bookings
            .iter()
            .filter(|b| b.payment_status != PaymentStatus::Paid)
            .collect();

        Self {
            clients: snapshot.clients.len(),
            upcoming_events: snapshot
                .events
                .iter()
                .filter(|e| e.is_upcoming(today))
                .count(),
            active_team: snapshot.team.iter().filter(|m| m.is_active()).count(),
            vendors: snapshot.vendors.len(),
            open_bookings: open.len(),
            unsettled_value: open.iter().map(|b| b.price).sum(),
        }
    }
}

/// The next `limit` upcoming events, soonest first
pub fn upcoming_events(snapshot: &Snapshot, today: NaiveDate, limit: usize) -> Vec<&Event> {
    let mut events: Vec<&Event> = snapshot
        .events
        .iter()
        .filter(|e| e.is_upcoming(today))
        .collect();
    events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.time.cmp(&b.time)));
    events.truncate(limit);
    events
}

impl fmt::Display for DashboardSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Clients:          {}", self.clients)?;
        writeln!(f, "Upcoming events:  {}", self.upcoming_events)?;
        writeln!(f, "Active team:      {}", self.active_team)?;
        writeln!(f, "Vendors:          {}", self.vendors)?;
        write!(
            f,
            "Open bookings:    {} ({})",
            self.open_bookings,
            format_currency(self.unsettled_value)
        )
    }
}
