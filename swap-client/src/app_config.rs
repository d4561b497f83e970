use serde::Deserialize;
use std::env;
use std::path::Path;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub geocoding: GeocodingConfig,
    pub directions: DirectionsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Bearer token of the signed-in user. Usually supplied through `SWAP__API__ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Comma separated ISO 3166-1 codes, e.g. "vn"
    #[serde(default)]
    pub country_codes: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectionsConfig {
    pub base_url: String,
    pub profile: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(None)
    }

    /// Layered load; `extra` is an explicit file given on the command line
    /// and wins over everything but the environment.
    pub fn load_with(extra: Option<&Path>) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = extra {
            builder = builder.add_source(config::File::from(path));
        }

        builder
            // e.g. SWAP__API__BASE_URL
            .add_source(config::Environment::with_prefix("SWAP").separator("__"))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("api.base_url", "http://localhost:8080/api/v1")?
            .set_default("api.timeout_seconds", 15)?
            .set_default("geocoding.base_url", "https://nominatim.openstreetmap.org")?
            .set_default("geocoding.user_agent", "swap-booking/0.1")?
            .set_default("geocoding.country_codes", "vn")?
            .set_default("directions.base_url", "https://router.project-osrm.org")?
            .set_default("directions.profile", "driving")?
            .set_default("logging.level", "info")
    }
}
