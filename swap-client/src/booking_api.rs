use async_trait::async_trait;
use reqwest::Method;
use swap_core::repository::{BookingApi, StationApi};
use swap_core::{ApiResponse, Booking, BookingDraft, Cabinet, CoreResult, ListQuery, Page, Station, Vehicle};
use tracing::info;

use crate::http::ApiClient;

/// REST adapter for both backend ports.
#[derive(Clone)]
pub struct HttpBookingApi {
    client: ApiClient,
}

impl HttpBookingApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BookingApi for HttpBookingApi {
    async fn get_user_vehicles(&self) -> CoreResult<Vec<Vehicle>> {
        self.client.get("/user-vehicles", &[]).await
    }

    async fn create_booking(&self, draft: &BookingDraft) -> CoreResult<ApiResponse<Booking>> {
        info!(
            "Creating booking: vehicle {} station {} batteries {:?}",
            draft.user_vehicle_id,
            draft.station_id,
            draft.selected_battery_ids()
        );
        let request = self.client.request(Method::POST, "/bookings").json(draft);
        self.client.send(request).await
    }

    async fn list_my_bookings(&self, query: &ListQuery) -> CoreResult<Page<Booking>> {
        self.client.get("/bookings/me", &query.to_query_pairs()).await
    }
}

#[async_trait]
impl StationApi for HttpBookingApi {
    async fn list_stations(&self, query: &ListQuery) -> CoreResult<Page<Station>> {
        self.client.get("/stations", &query.to_query_pairs()).await
    }

    async fn get_station_by_id(&self, station_id: i64) -> CoreResult<Station> {
        self.client.get(&format!("/stations/{}", station_id), &[]).await
    }

    async fn get_cabinets_by_station_and_battery_type(
        &self,
        station_id: i64,
        battery_type_id: i64,
    ) -> CoreResult<Vec<Cabinet>> {
        let query = [("batteryTypeId".to_string(), battery_type_id.to_string())];
        self.client
            .get(&format!("/stations/{}/cabinets", station_id), &query)
            .await
    }

    async fn get_cabinet_by_id(&self, cabinet_id: i64) -> CoreResult<Cabinet> {
        self.client.get(&format!("/cabinets/{}", cabinet_id), &[]).await
    }
}
