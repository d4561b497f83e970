use async_trait::async_trait;

use crate::booking::{ApiResponse, Booking, BookingDraft};
use crate::search::{ListQuery, Page};
use crate::station::{Cabinet, Station};
use crate::vehicle::Vehicle;
use crate::CoreResult;

/// Booking endpoints of the swap-station backend.
#[async_trait]
pub trait BookingApi: Send + Sync {
    /// Vehicles registered to the signed-in user
    async fn get_user_vehicles(&self) -> CoreResult<Vec<Vehicle>>;

    /// Submit a booking. A `success: false` envelope is returned as `Ok`,
    /// transport and HTTP-level failures as `Err`.
    async fn create_booking(&self, draft: &BookingDraft) -> CoreResult<ApiResponse<Booking>>;

    /// Booking history of the signed-in user
    async fn list_my_bookings(&self, query: &ListQuery) -> CoreResult<Page<Booking>>;
}

/// Station, cabinet and slot lookups.
#[async_trait]
pub trait StationApi: Send + Sync {
    async fn list_stations(&self, query: &ListQuery) -> CoreResult<Page<Station>>;

    async fn get_station_by_id(&self, station_id: i64) -> CoreResult<Station>;

    /// Cabinets of a station holding batteries of the given type
    async fn get_cabinets_by_station_and_battery_type(
        &self,
        station_id: i64,
        battery_type_id: i64,
    ) -> CoreResult<Vec<Cabinet>>;

    /// A cabinet with its nested slots
    async fn get_cabinet_by_id(&self, cabinet_id: i64) -> CoreResult<Cabinet>;
}
