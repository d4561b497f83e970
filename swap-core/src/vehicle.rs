use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BatteryType {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VehicleType {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub battery_type_id: Option<i64>,
    #[serde(default)]
    pub battery_type: Option<BatteryType>,
}

/// A vehicle registered to the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub license_plate: Option<String>,
    pub vehicle_type: VehicleType,
}

impl Vehicle {
    /// Battery type the vehicle needs. Zero ids count as unresolved.
    pub fn battery_type_id(&self) -> Option<i64> {
        self.vehicle_type
            .battery_type_id
            .filter(|id| *id != 0)
            .or_else(|| self.vehicle_type.battery_type.as_ref().map(|bt| bt.id))
            .filter(|id| *id != 0)
    }

    pub fn battery_type_name(&self) -> Option<&str> {
        self.vehicle_type.battery_type.as_ref().map(|bt| bt.name.as_str())
    }
}
