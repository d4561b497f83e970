use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use swap_core::geocoding::Geocoder;
use swap_core::{Coordinates, CoreError, CoreResult};
use tracing::debug;

use crate::app_config::GeocodingConfig;

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: Option<String>,
}

/// `/reverse` answers `{ "error": ... }` when nothing is there.
#[derive(Debug, Deserialize)]
struct ReversePlace {
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Geocoder speaking the Nominatim search/reverse API.
pub struct NominatimGeocoder {
    http: reqwest::Client,
    base_url: String,
    country_codes: String,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodingConfig, timeout: Duration) -> CoreResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::ConfigError(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            country_codes: config.country_codes.clone(),
        })
    }

    async fn fetch<T: for<'de> Deserialize<'de>>(&self, path: &str, query: &[(&str, String)]) -> CoreResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|e| CoreError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoreError::ServerError {
                status: status.as_u16(),
                message: String::new(),
            });
        }
        response.json().await.map_err(|e| CoreError::DecodeError(e.to_string()))
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>> {
        let mut query = vec![
            ("q", address.trim().to_string()),
            ("format", "json".to_string()),
            ("limit", "1".to_string()),
        ];
        if !self.country_codes.is_empty() {
            query.push(("countrycodes", self.country_codes.clone()));
        }

        let places: Vec<Place> = self.fetch("/search", &query).await?;
        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };
        debug!("Geocoded {:?} to {:?}", address, place.display_name);

        let lat = place.lat.parse::<f64>();
        let lng = place.lon.parse::<f64>();
        match (lat, lng) {
            (Ok(lat), Ok(lng)) => Ok(Some(Coordinates::new(lat, lng))),
            _ => Err(CoreError::DecodeError(format!(
                "bad coordinates {:?},{:?}",
                place.lat, place.lon
            ))),
        }
    }

    async fn reverse_geocode(&self, at: Coordinates) -> CoreResult<Option<String>> {
        let query = [
            ("lat", at.lat.to_string()),
            ("lon", at.lng.to_string()),
            ("format", "json".to_string()),
        ];
        let place: ReversePlace = self.fetch("/reverse", &query).await?;
        if let Some(error) = place.error {
            debug!("No address at {}: {}", at, error);
            return Ok(None);
        }
        Ok(place.display_name.filter(|name| !name.trim().is_empty()))
    }
}
