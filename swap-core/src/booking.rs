use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of batteries a single booking may reserve.
pub const MAX_BATTERIES_PER_BOOKING: usize = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    pub battery_id: i64,
}

/// The in-progress booking. Zero means "not chosen yet" for every scalar field,
/// which is also how the backend expects an unset value in the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub user_vehicle_id: i64,
    pub station_id: i64,
    pub user_lat: f64,
    pub user_lng: f64,
    pub booking_details: Vec<BookingDetail>,
}

impl BookingDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_vehicle(&self) -> bool {
        self.user_vehicle_id != 0
    }

    pub fn has_station(&self) -> bool {
        self.station_id != 0
    }

    pub fn has_location(&self) -> bool {
        self.user_lat != 0.0 && self.user_lng != 0.0
    }

    pub fn selected_battery_ids(&self) -> Vec<i64> {
        self.booking_details.iter().map(|d| d.battery_id).collect()
    }

    pub fn contains_battery(&self, battery_id: i64) -> bool {
        self.booking_details.iter().any(|d| d.battery_id == battery_id)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
    Expired,
    #[serde(other)]
    Other,
}

/// A booking as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: i64,
    pub status: BookingStatus,
    #[serde(default)]
    pub station_id: Option<i64>,
    #[serde(default)]
    pub user_vehicle_id: Option<i64>,
    #[serde(default)]
    pub booking_details: Vec<BookingDetail>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Response envelope used by every backend endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), data: Some(data) }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()), data: None }
    }

    /// Message text if the backend sent a non-blank one.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}
