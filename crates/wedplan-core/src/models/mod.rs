//! Record types for the wedding-planning dashboard.
//!
//! Every record carries a `RecordMeta` (store-assigned id plus created and
//! updated timestamps) and belongs to exactly one `Collection`:
//!
//! - `Client`: couples and their booked event
//! - `Event`: scheduled events, with a denormalized client name
//! - `TeamMember`, `Attendance`: staff roster and daily check-ins
//! - `Vendor`, `VendorBooking`: suppliers and their bookings per client
//! - `Finance`: income and expense entries

pub mod client;
pub mod event;
pub mod finance;
pub mod record;
pub mod team;
pub mod vendor;

pub use client::{Client, ClientStatus};
pub use event::{Event, EventStatus};
pub use finance::{Finance, FinanceKind};
pub use record::{Collection, Record, RecordMeta, DATABASE_NAME, DATABASE_VERSION};
pub use team::{Attendance, AttendanceStatus, EmploymentStatus, TeamMember};
pub use vendor::{PaymentStatus, Vendor, VendorBooking};
