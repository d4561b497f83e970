use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Severity of a user-facing notice (the toast of the web portal).
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, message)
    }
}

/// Emitted once the backend accepted a booking.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingSubmittedEvent {
    pub booking_id: Option<i64>,
    pub station_id: i64,
    pub user_vehicle_id: i64,
    pub battery_ids: Vec<i64>,
    pub timestamp: i64,
}
