//! In-memory implementations of the ports, for tests and offline demos.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use swap_shared::{Notice, NoticeLevel};

use crate::booking::{ApiResponse, Booking, BookingDraft, BookingStatus};
use crate::directions::{DirectionsProvider, Route, RouteStep};
use crate::geo::Coordinates;
use crate::geocoding::Geocoder;
use crate::repository::{BookingApi, StationApi};
use crate::search::{ListQuery, Page};
use crate::session::{AppRoute, Navigator, Notifier};
use crate::station::{Cabinet, Station};
use crate::vehicle::Vehicle;
use crate::{CoreError, CoreResult};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How `MockBookingApi::create_booking` answers.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Accept,
    /// `success: false` envelope with this message
    Reject(String),
    /// HTTP-level failure
    Fail { status: u16, message: String },
    Unreachable,
}

pub struct MockBookingApi {
    vehicles: Vec<Vehicle>,
    stations: Vec<Station>,
    cabinets: HashMap<i64, Cabinet>,
    outcome: Mutex<CreateOutcome>,
    submitted: Mutex<Vec<BookingDraft>>,
    history: Mutex<Vec<Booking>>,
    next_booking_id: AtomicUsize,
    cabinet_fetches: AtomicUsize,
    calls: AtomicUsize,
}

impl MockBookingApi {
    pub fn new() -> Self {
        Self {
            vehicles: Vec::new(),
            stations: Vec::new(),
            cabinets: HashMap::new(),
            outcome: Mutex::new(CreateOutcome::Accept),
            submitted: Mutex::new(Vec::new()),
            history: Mutex::new(Vec::new()),
            next_booking_id: AtomicUsize::new(1),
            cabinet_fetches: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_vehicles(mut self, vehicles: Vec<Vehicle>) -> Self {
        self.vehicles = vehicles;
        self
    }

    pub fn with_stations(mut self, stations: Vec<Station>) -> Self {
        self.stations = stations;
        self
    }

    pub fn with_cabinet(mut self, cabinet: Cabinet) -> Self {
        self.cabinets.insert(cabinet.id, cabinet);
        self
    }

    pub fn set_outcome(&self, outcome: CreateOutcome) {
        *lock(&self.outcome) = outcome;
    }

    /// Drafts received by `create_booking`, in call order.
    pub fn submitted(&self) -> Vec<BookingDraft> {
        lock(&self.submitted).clone()
    }

    pub fn create_calls(&self) -> usize {
        lock(&self.submitted).len()
    }

    pub fn cabinet_fetches(&self) -> usize {
        self.cabinet_fetches.load(Ordering::SeqCst)
    }

    /// Every call made through either trait.
    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Default for MockBookingApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BookingApi for MockBookingApi {
    async fn get_user_vehicles(&self) -> CoreResult<Vec<Vehicle>> {
        self.record_call();
        Ok(self.vehicles.clone())
    }

    async fn create_booking(&self, draft: &BookingDraft) -> CoreResult<ApiResponse<Booking>> {
        self.record_call();
        lock(&self.submitted).push(draft.clone());

        let outcome = lock(&self.outcome).clone();
        match outcome {
            CreateOutcome::Accept => {
                let id = self.next_booking_id.fetch_add(1, Ordering::SeqCst) as i64;
                let booking = Booking {
                    id,
                    status: BookingStatus::Pending,
                    station_id: Some(draft.station_id),
                    user_vehicle_id: Some(draft.user_vehicle_id),
                    booking_details: draft.booking_details.clone(),
                    created_at: Some(chrono::Utc::now()),
                };
                lock(&self.history).push(booking.clone());
                Ok(ApiResponse::ok(booking, "Đặt lịch thành công"))
            }
            CreateOutcome::Reject(message) => Ok(ApiResponse::failed(message)),
            CreateOutcome::Fail { status, message } => Err(CoreError::ServerError { status, message }),
            CreateOutcome::Unreachable => Err(CoreError::NetworkError("connection refused".to_string())),
        }
    }

    async fn list_my_bookings(&self, query: &ListQuery) -> CoreResult<Page<Booking>> {
        self.record_call();
        Ok(paginate(&lock(&self.history), query))
    }
}

#[async_trait]
impl StationApi for MockBookingApi {
    async fn list_stations(&self, query: &ListQuery) -> CoreResult<Page<Station>> {
        self.record_call();
        let needle = query.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Station> = self
            .stations
            .iter()
            .filter(|s| match &needle {
                Some(n) => s.name.to_lowercase().contains(n)
                    || s.address.as_deref().is_some_and(|a| a.to_lowercase().contains(n)),
                None => true,
            })
            .cloned()
            .collect();
        Ok(paginate(&matching, query))
    }

    async fn get_station_by_id(&self, station_id: i64) -> CoreResult<Station> {
        self.record_call();
        self.stations
            .iter()
            .find(|s| s.id == station_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("station {}", station_id)))
    }

    async fn get_cabinets_by_station_and_battery_type(
        &self,
        station_id: i64,
        battery_type_id: i64,
    ) -> CoreResult<Vec<Cabinet>> {
        self.record_call();
        let mut cabinets: Vec<Cabinet> = self
            .cabinets
            .values()
            .filter(|c| c.station_id == Some(station_id))
            .filter(|c| c.battery_type_id.map_or(true, |bt| bt == battery_type_id))
            .cloned()
            .collect();
        cabinets.sort_by_key(|c| c.id);
        Ok(cabinets)
    }

    async fn get_cabinet_by_id(&self, cabinet_id: i64) -> CoreResult<Cabinet> {
        self.record_call();
        self.cabinet_fetches.fetch_add(1, Ordering::SeqCst);
        self.cabinets
            .get(&cabinet_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("cabinet {}", cabinet_id)))
    }
}

fn paginate<T: Clone>(items: &[T], query: &ListQuery) -> Page<T> {
    let start = ((query.page.max(1) - 1) * query.limit) as usize;
    Page {
        items: items.iter().skip(start).take(query.limit as usize).cloned().collect(),
        total: items.len() as u64,
        page: query.page,
        limit: query.limit,
    }
}

/// Table-driven geocoder. Unknown inputs resolve to `None`.
#[derive(Default)]
pub struct MockGeocoder {
    forward: HashMap<String, Coordinates>,
    reverse: Vec<(Coordinates, String)>,
    failing: bool,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, address: &str, at: Coordinates) -> Self {
        self.forward.insert(address.trim().to_lowercase(), at);
        self.reverse.push((at, address.to_string()));
        self
    }

    /// Every lookup returns a network error.
    pub fn failing() -> Self {
        Self { failing: true, ..Self::default() }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, address: &str) -> CoreResult<Option<Coordinates>> {
        if self.failing {
            return Err(CoreError::NetworkError("geocoder offline".to_string()));
        }
        Ok(self.forward.get(&address.trim().to_lowercase()).copied())
    }

    async fn reverse_geocode(&self, at: Coordinates) -> CoreResult<Option<String>> {
        if self.failing {
            return Err(CoreError::NetworkError("geocoder offline".to_string()));
        }
        // Nearest known address within ~200 m
        Ok(self
            .reverse
            .iter()
            .filter(|(c, _)| c.distance_km(&at) < 0.2)
            .min_by(|(a, _), (b, _)| a.distance_km(&at).total_cmp(&b.distance_km(&at)))
            .map(|(_, address)| address.clone()))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        lock(&self.notices).iter().filter(|n| n.level == level).count()
    }

    pub fn last(&self) -> Option<Notice> {
        lock(&self.notices).last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<AppRoute>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn routes(&self) -> Vec<AppRoute> {
        lock(&self.routes).clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: AppRoute) {
        lock(&self.routes).push(route);
    }
}

/// Routes as the crow flies at a fixed urban speed.
pub struct StraightLineDirections {
    pub speed_kmh: f64,
}

impl Default for StraightLineDirections {
    fn default() -> Self {
        Self { speed_kmh: 30.0 }
    }
}

#[async_trait]
impl DirectionsProvider for StraightLineDirections {
    async fn driving_route(&self, from: Coordinates, to: Coordinates) -> CoreResult<Route> {
        let distance_m = from.distance_km(&to) * 1000.0;
        let duration_s = distance_m / (self.speed_kmh / 3.6);
        Ok(Route {
            geometry: vec![from, to],
            distance_m,
            duration_s,
            steps: vec![RouteStep {
                instruction: "arrive".to_string(),
                road_name: None,
                distance_m,
                duration_s,
            }],
        })
    }
}
