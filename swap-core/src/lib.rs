pub mod booking;
pub mod directions;
pub mod geo;
pub mod geocoding;
pub mod mock;
pub mod repository;
pub mod search;
pub mod session;
pub mod station;
pub mod vehicle;

pub use booking::{ApiResponse, Booking, BookingDetail, BookingDraft, BookingStatus};
pub use geo::Coordinates;
pub use search::{ListQuery, Page};
pub use station::{Battery, Cabinet, Slot, SlotStatus, Station};
pub use vehicle::{BatteryType, Vehicle, VehicleType};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Server responded {status}: {message}")]
    ServerError { status: u16, message: String },
    #[error("Malformed response: {0}")]
    DecodeError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CoreError {
    /// Message suitable for a user-facing notice, if the backend supplied one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            CoreError::ServerError { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_only_for_server_errors() {
        let err = CoreError::ServerError { status: 409, message: "Pin đã được đặt".to_string() };
        assert_eq!(err.server_message(), Some("Pin đã được đặt"));

        let empty = CoreError::ServerError { status: 500, message: String::new() };
        assert_eq!(empty.server_message(), None);

        let net = CoreError::NetworkError("timeout".to_string());
        assert_eq!(net.server_message(), None);
    }
}
