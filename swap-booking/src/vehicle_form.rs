use std::fmt;

use swap_core::{BookingDraft, Station, Vehicle};

/// Whether the chosen vehicle can be served at the chosen station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compatibility {
    /// Vehicle or station not chosen yet
    Unknown,
    Compatible,
    Incompatible,
}

/// Compatibility flag plus the message shown under the form. The gate only
/// ever reads `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompatibilityCheck {
    pub status: Compatibility,
    pub message: String,
}

impl CompatibilityCheck {
    pub fn unknown() -> Self {
        Self {
            status: Compatibility::Unknown,
            message: "Vui lòng chọn xe để kiểm tra loại pin".to_string(),
        }
    }

    pub fn evaluate(vehicle: Option<&Vehicle>, station: Option<&Station>) -> Self {
        let Some(vehicle) = vehicle else {
            return Self::unknown();
        };
        let Some(battery_type_id) = vehicle.battery_type_id() else {
            return Self {
                status: Compatibility::Incompatible,
                message: "Xe chưa được gán loại pin, vui lòng liên hệ hỗ trợ".to_string(),
            };
        };
        let Some(station) = station else {
            return Self {
                status: Compatibility::Unknown,
                message: "Vui lòng chọn trạm đổi pin".to_string(),
            };
        };

        if !station.supports_battery_type(battery_type_id) {
            return Self {
                status: Compatibility::Incompatible,
                message: format!("Trạm {} không có pin phù hợp với xe của bạn", station.name),
            };
        }

        let battery = vehicle
            .battery_type_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("loại #{}", battery_type_id));
        Self {
            status: Compatibility::Compatible,
            message: format!("Hãy chọn pin {} tại trạm {}", battery, station.name),
        }
    }

    pub fn is_compatible(&self) -> bool {
        self.status == Compatibility::Compatible
    }
}

/// A condition keeping the step-1 Continue control disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step1Blocker {
    VehicleNotSelected,
    StationNotSelected,
    LocationUnresolved,
    BatteryTypeUnresolved,
    Incompatible,
}

impl fmt::Display for Step1Blocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Step1Blocker::VehicleNotSelected => "no vehicle selected",
            Step1Blocker::StationNotSelected => "no station selected",
            Step1Blocker::LocationUnresolved => "location not resolved",
            Step1Blocker::BatteryTypeUnresolved => "vehicle has no battery type",
            Step1Blocker::Incompatible => "station does not serve the vehicle's battery type",
        };
        f.write_str(text)
    }
}

/// Step 1 state: the vehicle list, the address text and what is derived from them.
#[derive(Debug, Clone)]
pub struct VehicleForm {
    vehicles: Vec<Vehicle>,
    address: String,
    battery_type_id: Option<i64>,
    compatibility: CompatibilityCheck,
}

impl VehicleForm {
    pub fn new() -> Self {
        Self {
            vehicles: Vec::new(),
            address: String::new(),
            battery_type_id: None,
            compatibility: CompatibilityCheck::unknown(),
        }
    }

    pub fn set_vehicles(&mut self, vehicles: Vec<Vehicle>) {
        self.vehicles = vehicles;
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn find_vehicle(&self, vehicle_id: i64) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == vehicle_id)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Battery type required by the selected vehicle
    pub fn battery_type_id(&self) -> Option<i64> {
        self.battery_type_id
    }

    pub fn compatibility(&self) -> &CompatibilityCheck {
        &self.compatibility
    }

    /// Recompute the derived fields after the vehicle or station changed.
    pub fn refresh(&mut self, vehicle_id: i64, station: Option<&Station>) {
        let vehicle = self.find_vehicle(vehicle_id);
        let battery_type_id = vehicle.and_then(Vehicle::battery_type_id);
        let compatibility = CompatibilityCheck::evaluate(vehicle, station);

        self.battery_type_id = battery_type_id;
        self.compatibility = compatibility;
    }

    pub fn blockers(&self, draft: &BookingDraft) -> Vec<Step1Blocker> {
        let mut blockers = Vec::new();
        if !draft.has_vehicle() {
            blockers.push(Step1Blocker::VehicleNotSelected);
        }
        if !draft.has_station() {
            blockers.push(Step1Blocker::StationNotSelected);
        }
        if !draft.has_location() {
            blockers.push(Step1Blocker::LocationUnresolved);
        }
        if self.battery_type_id.is_none() {
            blockers.push(Step1Blocker::BatteryTypeUnresolved);
        }
        if !self.compatibility.is_compatible() {
            blockers.push(Step1Blocker::Incompatible);
        }
        blockers
    }

    /// Step-1 gate: every condition must hold at once.
    pub fn is_valid(&self, draft: &BookingDraft) -> bool {
        self.blockers(draft).is_empty()
    }

    /// Forget everything but the fetched vehicle list.
    pub fn clear(&mut self) {
        self.address.clear();
        self.battery_type_id = None;
        self.compatibility = CompatibilityCheck::unknown();
    }
}

impl Default for VehicleForm {
    fn default() -> Self {
        Self::new()
    }
}
