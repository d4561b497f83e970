use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;

/// Slot status as reported by the backend. Unknown values deserialize to `Other`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SlotStatus {
    Available,
    Reserved,
    Charging,
    Empty,
    Maintenance,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Battery {
    pub id: i64,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub battery_type_id: Option<i64>,
    #[serde(default)]
    pub charge_level: Option<f64>,
}

/// One physical slot of a swap cabinet. Read-only: the backend owns its state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: i64,
    pub name: String,
    pub status: SlotStatus,
    #[serde(default)]
    pub battery_id: Option<i64>,
    #[serde(default)]
    pub battery: Option<Battery>,
}

impl Slot {
    /// Only available slots holding a battery can be picked.
    pub fn is_selectable(&self) -> bool {
        self.status == SlotStatus::Available && self.battery_id.is_some()
    }

    pub fn battery_type_id(&self) -> Option<i64> {
        self.battery.as_ref().and_then(|b| b.battery_type_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cabinet {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub station_id: Option<i64>,
    #[serde(default)]
    pub battery_type_id: Option<i64>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub status: Option<String>,
    /// Battery types served by the station's cabinets. Empty means not advertised.
    #[serde(default)]
    pub battery_type_ids: Vec<i64>,
}

impl Station {
    pub fn location(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn supports_battery_type(&self, battery_type_id: i64) -> bool {
        self.battery_type_ids.is_empty() || self.battery_type_ids.contains(&battery_type_id)
    }
}
