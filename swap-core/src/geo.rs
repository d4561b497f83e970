use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// (0, 0) is the "unresolved" marker used by the booking draft.
    pub fn is_resolved(&self) -> bool {
        self.lat != 0.0 && self.lng != 0.0
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let delta_lat = (other.lat - self.lat).to_radians();
        let delta_lng = (other.lng - self.lng).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

impl std::str::FromStr for Coordinates {
    type Err = crate::CoreError;

    /// Parses `"lat,lng"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| crate::CoreError::ValidationError(format!("expected \"lat,lng\", got {:?}", s)))?;
        let lat: f64 = lat.trim().parse()
            .map_err(|_| crate::CoreError::ValidationError(format!("invalid latitude: {}", lat.trim())))?;
        let lng: f64 = lng.trim().parse()
            .map_err(|_| crate::CoreError::ValidationError(format!("invalid longitude: {}", lng.trim())))?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(crate::CoreError::ValidationError(format!("coordinates out of range: {},{}", lat, lng)));
        }
        Ok(Self { lat, lng })
    }
}
