use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use swap_core::directions::{DirectionsProvider, Route, RouteStep};
use swap_core::{Coordinates, CoreError, CoreResult};

use crate::app_config::DirectionsConfig;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    /// GeoJSON order: [lng, lat]
    coordinates: Vec<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    distance: f64,
    duration: f64,
    #[serde(default)]
    name: String,
    maneuver: Maneuver,
}

#[derive(Debug, Deserialize)]
struct Maneuver {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    modifier: Option<String>,
}

impl OsrmStep {
    fn into_step(self) -> RouteStep {
        let mut instruction = match self.maneuver.modifier.as_deref() {
            Some(modifier) => format!("{} {}", self.maneuver.kind, modifier),
            None => self.maneuver.kind.clone(),
        };
        if !self.name.is_empty() {
            instruction.push_str(" onto ");
            instruction.push_str(&self.name);
        }
        RouteStep {
            instruction,
            road_name: (!self.name.is_empty()).then_some(self.name),
            distance_m: self.distance,
            duration_s: self.duration,
        }
    }
}

impl From<OsrmRoute> for Route {
    fn from(route: OsrmRoute) -> Self {
        Route {
            geometry: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| Coordinates::new(lat, lng))
                .collect(),
            distance_m: route.distance,
            duration_s: route.duration,
            steps: route
                .legs
                .into_iter()
                .flat_map(|leg| leg.steps)
                .map(OsrmStep::into_step)
                .collect(),
        }
    }
}

/// Directions from an OSRM routing server.
pub struct OsrmDirections {
    http: reqwest::Client,
    base_url: String,
    profile: String,
}

impl OsrmDirections {
    pub fn new(config: &DirectionsConfig, timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::ConfigError(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    fn route_url(&self, from: Coordinates, to: Coordinates) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.base_url, self.profile, from.lng, from.lat, to.lng, to.lat
        )
    }
}

#[async_trait]
impl DirectionsProvider for OsrmDirections {
    async fn driving_route(&self, from: Coordinates, to: Coordinates) -> CoreResult<Route> {
        let response = self
            .http
            .get(self.route_url(from, to))
            .query(&[("steps", "true"), ("geometries", "geojson"), ("overview", "full")])
            .send()
            .await
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;

        // OSRM reports NoRoute and friends with a 400 and a JSON body
        let status = response.status();
        let body: OsrmResponse = response.json().await.map_err(|e| {
            if status.is_success() {
                CoreError::DecodeError(e.to_string())
            } else {
                CoreError::ServerError { status: status.as_u16(), message: String::new() }
            }
        })?;

        if body.code != "Ok" {
            return Err(CoreError::NotFound(body.message.unwrap_or(body.code)));
        }
        body.routes
            .into_iter()
            .next()
            .map(Route::from)
            .ok_or_else(|| CoreError::NotFound("no route".to_string()))
    }
}
