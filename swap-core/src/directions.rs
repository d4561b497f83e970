use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::Coordinates;
use crate::CoreResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteStep {
    pub instruction: String,
    pub road_name: Option<String>,
    pub distance_m: f64,
    pub duration_s: f64,
}

/// A driving route, for display only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Route {
    pub geometry: Vec<Coordinates>,
    pub distance_m: f64,
    pub duration_s: f64,
    pub steps: Vec<RouteStep>,
}

impl Route {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    pub fn duration_minutes(&self) -> f64 {
        self.duration_s / 60.0
    }
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn driving_route(&self, from: Coordinates, to: Coordinates) -> CoreResult<Route>;
}
