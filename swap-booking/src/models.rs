use serde::{Deserialize, Serialize};
use swap_core::BookingDetail;

/// Wizard step discriminator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStep {
    VehicleAndLocation,
    BatterySelection,
}

impl BookingStep {
    pub fn number(&self) -> u8 {
        match self {
            BookingStep::VehicleAndLocation => 1,
            BookingStep::BatterySelection => 2,
        }
    }
}

/// One field update merged into the draft.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftField {
    UserVehicleId(i64),
    StationId(i64),
    UserLat(f64),
    UserLng(f64),
    BookingDetails(Vec<BookingDetail>),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModalState {
    Open,
    Closed,
}
