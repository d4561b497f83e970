use async_trait::async_trait;

use crate::geo::Coordinates;
use crate::CoreResult;

/// Forward and reverse geocoding. `Ok(None)` means the service had no match;
/// callers leave the field unresolved in that case.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>>;

    async fn reverse_geocode(&self, at: Coordinates) -> CoreResult<Option<String>>;
}
