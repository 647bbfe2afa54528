use serde::{Deserialize, Serialize};

use super::record::{impl_record, Collection, RecordMeta};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub name: String,
    /// e.g. "catering", "decoration", "photography"
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub services: Vec<String>,
}

impl_record!(Vendor, Collection::Vendors);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Unpaid => write!(f, "Unpaid"),
            PaymentStatus::Partial => write!(f, "Partial"),
            PaymentStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// A vendor hired for a client's event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct VendorBooking {
    #[serde(flatten)]
    pub meta: RecordMeta,
    pub client_id: i64,
    pub vendor_id: i64,
    /// YYYY-MM-DD
    pub event_date: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

impl_record!(VendorBooking, Collection::VendorBookings);

impl VendorBooking {
    pub fn is_settled(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_field_names() {
        let booking = VendorBooking {
            client_id: 1,
            vendor_id: 2,
            event_date: "2025-03-01".to_string(),
            price: 2_500_000.0,
            payment_status: PaymentStatus::Partial,
            ..Default::default()
        };
        let json = serde_json::to_value(&booking).unwrap();
        assert_eq!(json["clientId"], 1);
        assert_eq!(json["vendorId"], 2);
        assert_eq!(json["eventDate"], "2025-03-01");
        assert_eq!(json["paymentStatus"], "partial");
        assert!(json.get("id").is_none());
        assert!(!booking.is_settled());
    }
}
