pub mod app_config;
pub mod http;
pub mod booking_api;
pub mod nominatim;
pub mod osrm;

pub use app_config::Config;
pub use booking_api::HttpBookingApi;
pub use http::ApiClient;
pub use nominatim::NominatimGeocoder;
pub use osrm::OsrmDirections;
