use std::sync::Arc;

use swap_catalog::{SelectorError, StationSelector};
use swap_core::directions::{DirectionsProvider, Route};
use swap_core::geocoding::Geocoder;
use swap_core::repository::{BookingApi, StationApi};
use swap_core::session::{AppRoute, Navigator, Notifier};
use swap_core::{Booking, BookingDraft, Cabinet, Coordinates, CoreError, CoreResult, ListQuery, Station};
use swap_shared::BookingSubmittedEvent;
use tracing::{debug, error, info, warn};

use crate::draft::DraftController;
use crate::guard::{RequestGeneration, Ticket};
use crate::models::{BookingStep, DraftField, ModalState};
use crate::slot_picker::{SlotPicker, SlotToggle};
use crate::vehicle_form::{Step1Blocker, VehicleForm};

pub const LIMIT_WARNING: &str = "Bạn chỉ có thể chọn tối đa 2 cục pin";
pub const INCOMPATIBLE_WARNING: &str = "Pin này không phù hợp với loại pin của xe";
pub const SUBMIT_SUCCESS: &str = "Đặt lịch đổi pin thành công";
pub const SUBMIT_FALLBACK_ERROR: &str = "Đặt lịch thất bại, vui lòng thử lại";
const VEHICLES_LOAD_ERROR: &str = "Không tải được danh sách xe";
const CABINET_LOAD_ERROR: &str = "Không tải được thông tin tủ pin";

/// Collaborators of the wizard, passed in explicitly.
#[derive(Clone)]
pub struct WizardContext {
    pub bookings: Arc<dyn BookingApi>,
    pub stations: Arc<dyn StationApi>,
    pub geocoder: Arc<dyn Geocoder>,
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    Submitted {
        booking: Option<Booking>,
        event: BookingSubmittedEvent,
    },
    /// Backend refused or was unreachable; the draft is kept for a retry
    Rejected { message: String },
    /// Step-2 gate not satisfied; nothing was sent
    NotReady,
}

/// Two-step booking flow: vehicle and location, then battery slots.
pub struct BookingWizard {
    ctx: WizardContext,
    controller: DraftController,
    modal: ModalState,
    form: VehicleForm,
    stations: StationSelector,
    picker: SlotPicker,
    location_requests: RequestGeneration,
    cabinet_requests: RequestGeneration,
    /// Station and battery type the current picks were made for
    picks_for: Option<(i64, i64)>,
}

impl BookingWizard {
    /// Open the booking modal with an empty draft.
    pub fn open(ctx: WizardContext) -> Self {
        Self {
            ctx,
            controller: DraftController::new(),
            modal: ModalState::Open,
            form: VehicleForm::new(),
            stations: StationSelector::new(Vec::new()),
            picker: SlotPicker::default(),
            location_requests: RequestGeneration::new(),
            cabinet_requests: RequestGeneration::new(),
            picks_for: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.modal == ModalState::Open
    }

    pub fn modal(&self) -> ModalState {
        self.modal
    }

    pub fn step(&self) -> BookingStep {
        self.controller.step()
    }

    pub fn draft(&self) -> &BookingDraft {
        self.controller.draft()
    }

    pub fn form(&self) -> &VehicleForm {
        &self.form
    }

    pub fn picker(&self) -> &SlotPicker {
        &self.picker
    }

    pub fn stations(&self) -> &StationSelector {
        &self.stations
    }

    /// Re-open after a close or a successful submit. Fetched vehicles and stations are kept.
    pub fn reopen(&mut self) {
        self.modal = ModalState::Open;
    }

    // ---- Step 1 ----

    pub async fn load_vehicles(&mut self) -> Result<usize, WizardError> {
        match self.ctx.bookings.get_user_vehicles().await {
            Ok(vehicles) => {
                let count = vehicles.len();
                self.form.set_vehicles(vehicles);
                self.refresh_derived();
                debug!("Loaded {} vehicles", count);
                Ok(count)
            }
            Err(e) => {
                warn!("Failed to load vehicles: {}", e);
                self.ctx.notifier.error(VEHICLES_LOAD_ERROR);
                Err(e.into())
            }
        }
    }

    pub async fn load_stations(&mut self, query: ListQuery) -> Result<usize, WizardError> {
        self.ensure_step(BookingStep::VehicleAndLocation)?;
        self.stations = StationSelector::load(self.ctx.stations.as_ref(), query).await?;
        self.controller.set_field(DraftField::StationId(0));
        self.refresh_derived();
        Ok(self.stations.stations().len())
    }

    pub fn set_stations(&mut self, stations: Vec<Station>) -> Result<(), WizardError> {
        self.ensure_step(BookingStep::VehicleAndLocation)?;
        self.stations = StationSelector::new(stations);
        self.controller.set_field(DraftField::StationId(0));
        self.refresh_derived();
        Ok(())
    }

    pub fn select_vehicle(&mut self, vehicle_id: i64) -> Result<(), WizardError> {
        self.ensure_step(BookingStep::VehicleAndLocation)?;
        if self.form.find_vehicle(vehicle_id).is_none() {
            return Err(WizardError::UnknownVehicle(vehicle_id));
        }
        self.controller.set_field(DraftField::UserVehicleId(vehicle_id));
        self.refresh_derived();
        debug!("Vehicle {} selected, battery type {:?}", vehicle_id, self.form.battery_type_id());
        Ok(())
    }

    pub fn select_station(&mut self, station_id: i64) -> Result<(), WizardError> {
        self.ensure_step(BookingStep::VehicleAndLocation)?;
        self.stations.select(station_id)?;
        self.controller.set_field(DraftField::StationId(station_id));
        self.refresh_derived();
        Ok(())
    }

    fn refresh_derived(&mut self) {
        let vehicle_id = self.controller.draft().user_vehicle_id;
        self.form.refresh(vehicle_id, self.stations.selected());

        if self.picks_for.is_some() && self.picks_for != self.picks_key() {
            self.drop_picks();
        }
    }

    fn picks_key(&self) -> Option<(i64, i64)> {
        let station_id = self.controller.draft().station_id;
        self.form.battery_type_id().map(|battery_type_id| (station_id, battery_type_id))
    }

    /// Picked batteries belong to one station's cabinets; a new station or
    /// battery type starts step 2 over.
    fn drop_picks(&mut self) {
        if !self.controller.draft().booking_details.is_empty() {
            info!("Station or battery type changed, dropping picked batteries");
        }
        self.controller.set_field(DraftField::BookingDetails(Vec::new()));
        self.picker = SlotPicker::default();
        self.cabinet_requests.invalidate();
        self.picks_for = None;
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.form.set_address(address);
    }

    /// Start a forward geocode of the current address. Any older location
    /// request becomes stale.
    pub fn begin_geocode(&mut self) -> Ticket {
        self.location_requests.begin()
    }

    /// Apply a forward geocode response. Returns whether the location changed.
    pub fn apply_geocode(&mut self, ticket: Ticket, result: CoreResult<Option<Coordinates>>) -> bool {
        if !self.location_requests.is_current(ticket) {
            debug!("Discarding stale geocode response");
            return false;
        }
        match result {
            Ok(Some(at)) => {
                self.set_location(at);
                true
            }
            Ok(None) => {
                warn!("No geocoding match for {:?}", self.form.address());
                false
            }
            Err(e) => {
                warn!("Geocoding failed: {}", e);
                false
            }
        }
    }

    /// Geocode the address text (the form's blur handler).
    pub async fn resolve_address(&mut self) -> bool {
        let address = self.form.address().trim().to_string();
        if address.is_empty() {
            return false;
        }
        let ticket = self.begin_geocode();
        let result = self.ctx.geocoder.geocode(&address).await;
        self.apply_geocode(ticket, result)
    }

    /// Map click or device geolocation: take the coordinates as-is and start
    /// a reverse geocode to fill the address.
    pub fn begin_pick_location(&mut self, at: Coordinates) -> Ticket {
        self.set_location(at);
        self.location_requests.begin()
    }

    /// Apply a reverse geocode response. Returns whether the address changed.
    pub fn apply_reverse_geocode(&mut self, ticket: Ticket, result: CoreResult<Option<String>>) -> bool {
        if !self.location_requests.is_current(ticket) {
            debug!("Discarding stale reverse geocode response");
            return false;
        }
        match result {
            Ok(Some(address)) => {
                self.form.set_address(address);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                false
            }
        }
    }

    pub async fn pick_location(&mut self, at: Coordinates) -> bool {
        let ticket = self.begin_pick_location(at);
        let result = self.ctx.geocoder.reverse_geocode(at).await;
        self.apply_reverse_geocode(ticket, result)
    }

    fn set_location(&mut self, at: Coordinates) {
        self.controller.set_field(DraftField::UserLat(at.lat));
        self.controller.set_field(DraftField::UserLng(at.lng));
    }

    pub fn user_location(&self) -> Option<Coordinates> {
        let draft = self.controller.draft();
        draft.has_location().then(|| Coordinates::new(draft.user_lat, draft.user_lng))
    }

    pub fn step1_blockers(&self) -> Vec<Step1Blocker> {
        self.form.blockers(self.controller.draft())
    }

    /// Gate of the current step.
    pub fn is_booking_data_valid(&self) -> bool {
        match self.controller.step() {
            BookingStep::VehicleAndLocation => self.form.is_valid(self.controller.draft()),
            BookingStep::BatterySelection => SlotPicker::is_valid(self.controller.draft()),
        }
    }

    /// The Continue control. Moves to step 2 when the step-1 gate holds;
    /// otherwise nothing happens. Makes no network call.
    pub fn continue_to_slots(&mut self) -> bool {
        if self.controller.step() != BookingStep::VehicleAndLocation || !self.is_booking_data_valid() {
            return false;
        }
        self.picker = SlotPicker::new(self.form.battery_type_id());
        self.picks_for = self.picks_key();
        self.controller.advance_step(BookingStep::BatterySelection);
        info!(
            "Booking step 2: station {} battery type {:?}",
            self.controller.draft().station_id,
            self.form.battery_type_id()
        );
        true
    }

    /// Back to step 1. Picked batteries stay in the draft.
    pub fn back_to_vehicle_form(&mut self) {
        self.cabinet_requests.invalidate();
        self.controller.advance_step(BookingStep::VehicleAndLocation);
    }

    // ---- Step 2 ----

    pub fn begin_cabinet_fetch(&mut self) -> Ticket {
        self.cabinet_requests.begin()
    }

    /// Apply the cabinet list. `Ok(false)` when the response was stale.
    pub fn apply_cabinets(&mut self, ticket: Ticket, result: CoreResult<Vec<Cabinet>>) -> Result<bool, WizardError> {
        if !self.cabinet_requests.is_current(ticket) {
            debug!("Discarding stale cabinet list");
            return Ok(false);
        }
        match result {
            Ok(cabinets) => {
                self.picker.set_cabinets(cabinets);
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to load cabinets: {}", e);
                self.ctx.notifier.error(CABINET_LOAD_ERROR);
                Err(e.into())
            }
        }
    }

    /// Apply a cabinet with its slots. `Ok(false)` when the response was stale.
    pub fn apply_cabinet(&mut self, ticket: Ticket, result: CoreResult<Cabinet>) -> Result<bool, WizardError> {
        if !self.cabinet_requests.is_current(ticket) {
            debug!("Discarding stale cabinet slots");
            return Ok(false);
        }
        match result {
            Ok(cabinet) => {
                debug!("Cabinet {} open with {} slots", cabinet.id, cabinet.slots.len());
                self.picker.open_cabinet(cabinet);
                Ok(true)
            }
            Err(e) => {
                warn!("Failed to load cabinet: {}", e);
                self.ctx.notifier.error(CABINET_LOAD_ERROR);
                Err(e.into())
            }
        }
    }

    /// Fetch the cabinets for the chosen station and battery type and open the first one.
    pub async fn load_cabinets(&mut self) -> Result<usize, WizardError> {
        self.ensure_step(BookingStep::BatterySelection)?;
        let battery_type_id = self
            .form
            .battery_type_id()
            .ok_or_else(|| WizardError::NotReady("battery type unresolved".to_string()))?;
        let station_id = self.controller.draft().station_id;

        let ticket = self.begin_cabinet_fetch();
        let result = self
            .ctx
            .stations
            .get_cabinets_by_station_and_battery_type(station_id, battery_type_id)
            .await;
        if !self.apply_cabinets(ticket, result)? {
            return Ok(0);
        }

        if let Some(first) = self.picker.cabinets().first().map(|c| c.id) {
            self.open_cabinet(first).await?;
        }
        Ok(self.picker.cabinets().len())
    }

    /// Fetch live slot data for one cabinet.
    pub async fn open_cabinet(&mut self, cabinet_id: i64) -> Result<bool, WizardError> {
        self.ensure_step(BookingStep::BatterySelection)?;
        let ticket = self.begin_cabinet_fetch();
        let result = self.ctx.stations.get_cabinet_by_id(cabinet_id).await;
        self.apply_cabinet(ticket, result)
    }

    /// Click on a slot of the open cabinet.
    pub fn toggle_slot(&mut self, slot_id: i64) -> SlotToggle {
        let outcome = self.picker.toggle(self.controller.draft_mut(), slot_id);
        match outcome {
            SlotToggle::LimitReached => {
                warn!("Slot {} rejected: battery limit reached", slot_id);
                self.ctx.notifier.warning(LIMIT_WARNING);
            }
            SlotToggle::IncompatibleBattery => {
                warn!("Slot {} rejected: incompatible battery", slot_id);
                self.ctx.notifier.warning(INCOMPATIBLE_WARNING);
            }
            SlotToggle::Selected { battery_id } => debug!("Battery {} selected", battery_id),
            SlotToggle::Deselected { battery_id } => debug!("Battery {} deselected", battery_id),
            SlotToggle::Ignored | SlotToggle::UnknownSlot => {}
        }
        outcome
    }

    /// Send the draft. On success the draft is reset, the modal closes and
    /// the user is sent to the booking history.
    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.controller.step() != BookingStep::BatterySelection || !self.is_booking_data_valid() {
            return SubmitOutcome::NotReady;
        }

        let draft = self.controller.draft().clone();
        match self.ctx.bookings.create_booking(&draft).await {
            Ok(resp) if resp.success => {
                let message = resp.message().unwrap_or(SUBMIT_SUCCESS).to_string();
                let event = BookingSubmittedEvent {
                    booking_id: resp.data.as_ref().map(|b| b.id),
                    station_id: draft.station_id,
                    user_vehicle_id: draft.user_vehicle_id,
                    battery_ids: draft.selected_battery_ids(),
                    timestamp: chrono::Utc::now().timestamp(),
                };
                info!("Booking created: {:?}", event);

                self.ctx.notifier.success(&message);
                self.discard();
                self.ctx.navigator.navigate(AppRoute::BookingHistory);

                SubmitOutcome::Submitted { booking: resp.data, event }
            }
            Ok(resp) => {
                let message = resp.message().unwrap_or(SUBMIT_FALLBACK_ERROR).to_string();
                error!("Booking rejected by server: {}", message);
                self.ctx.notifier.error(&message);
                SubmitOutcome::Rejected { message }
            }
            Err(e) => {
                error!("Booking submit failed: {}", e);
                let message = e.server_message().unwrap_or(SUBMIT_FALLBACK_ERROR).to_string();
                self.ctx.notifier.error(&message);
                SubmitOutcome::Rejected { message }
            }
        }
    }

    /// Close the modal, dropping the draft.
    pub fn close(&mut self) {
        self.discard();
        info!("Booking wizard closed");
    }

    fn discard(&mut self) {
        self.controller.reset();
        self.form.clear();
        self.stations.clear();
        self.picker = SlotPicker::default();
        self.location_requests.invalidate();
        self.cabinet_requests.invalidate();
        self.picks_for = None;
        self.modal = ModalState::Closed;
    }

    /// Driving directions from the user's location to the chosen station.
    pub async fn route_to_station(&self, provider: &dyn DirectionsProvider) -> Result<Route, WizardError> {
        let from = self
            .user_location()
            .ok_or_else(|| WizardError::NotReady("location not resolved".to_string()))?;
        let station = self
            .stations
            .selected()
            .ok_or_else(|| WizardError::NotReady("no station selected".to_string()))?;
        Ok(provider.driving_route(from, station.location()).await?)
    }

    fn ensure_step(&self, expected: BookingStep) -> Result<(), WizardError> {
        let actual = self.controller.step();
        if actual != expected {
            return Err(WizardError::WrongStep { expected, actual });
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Vehicle not found: {0}")]
    UnknownVehicle(i64),

    #[error(transparent)]
    Station(#[from] SelectorError),

    #[error(transparent)]
    Api(#[from] CoreError),

    #[error("Wrong step: expected {expected:?}, currently {actual:?}")]
    WrongStep {
        expected: BookingStep,
        actual: BookingStep,
    },

    #[error("Not ready: {0}")]
    NotReady(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use swap_core::mock::{CreateOutcome, MockBookingApi, MockGeocoder, RecordingNavigator, RecordingNotifier};
    use swap_core::{Battery, Slot, SlotStatus, Vehicle, VehicleType};
    use swap_shared::NoticeLevel;

    const HOME: Coordinates = Coordinates { lat: 10.77, lng: 106.70 };

    struct Fixture {
        api: Arc<MockBookingApi>,
        notifier: Arc<RecordingNotifier>,
        navigator: Arc<RecordingNavigator>,
        wizard: BookingWizard,
    }

    fn slot(id: i64, status: SlotStatus, battery_id: Option<i64>) -> Slot {
        Slot {
            id,
            name: format!("S{}", id),
            status,
            battery_id,
            battery: battery_id.map(|bid| Battery {
                id: bid,
                serial_number: None,
                battery_type_id: Some(3),
                charge_level: Some(95.0),
            }),
        }
    }

    fn fixture_with(api: MockBookingApi, geocoder: MockGeocoder) -> Fixture {
        let api = Arc::new(api);
        let notifier = Arc::new(RecordingNotifier::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let ctx = WizardContext {
            bookings: api.clone(),
            stations: api.clone(),
            geocoder: Arc::new(geocoder),
            notifier: notifier.clone(),
            navigator: navigator.clone(),
        };
        Fixture { api, notifier, navigator, wizard: BookingWizard::open(ctx) }
    }

    fn fixture() -> Fixture {
        let api = MockBookingApi::new()
            .with_vehicles(vec![Vehicle {
                id: 7,
                name: "Klara S".to_string(),
                license_plate: None,
                vehicle_type: VehicleType { id: 1, name: "Xe máy điện".to_string(), battery_type_id: Some(3), battery_type: None },
            }])
            .with_stations(vec![Station {
                id: 5,
                name: "Quận 1".to_string(),
                address: Some("1 Lê Duẩn".to_string()),
                latitude: 10.7769,
                longitude: 106.7009,
                status: Some("ACTIVE".to_string()),
                battery_type_ids: vec![3],
            }])
            .with_cabinet(Cabinet {
                id: 12,
                name: "Tủ 1".to_string(),
                station_id: Some(5),
                battery_type_id: Some(3),
                slots: vec![
                    slot(1, SlotStatus::Available, Some(101)),
                    slot(2, SlotStatus::Available, Some(102)),
                    slot(3, SlotStatus::Available, Some(103)),
                    slot(4, SlotStatus::Charging, Some(104)),
                ],
            });
        let geocoder = MockGeocoder::new().with_address("12 Nguyễn Huệ, Quận 1", HOME);
        fixture_with(api, geocoder)
    }

    /// Step 1 filled in except the vehicle.
    async fn station_and_location(f: &mut Fixture) {
        f.wizard.load_vehicles().await.unwrap();
        f.wizard.load_stations(ListQuery::default()).await.unwrap();
        f.wizard.select_station(5).unwrap();
        f.wizard.set_address("12 Nguyễn Huệ, Quận 1");
        assert!(f.wizard.resolve_address().await);
    }

    async fn at_step_two(f: &mut Fixture) {
        station_and_location(f).await;
        f.wizard.select_vehicle(7).unwrap();
        assert!(f.wizard.continue_to_slots());
        assert_eq!(f.wizard.load_cabinets().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_gate_false_without_vehicle() {
        let mut f = fixture();
        station_and_location(&mut f).await;

        let draft = f.wizard.draft();
        assert_eq!((draft.user_vehicle_id, draft.station_id), (0, 5));
        assert_eq!((draft.user_lat, draft.user_lng), (10.77, 106.70));
        assert!(!f.wizard.is_booking_data_valid());
        assert_eq!(
            f.wizard.step1_blockers(),
            vec![
                Step1Blocker::VehicleNotSelected,
                Step1Blocker::BatteryTypeUnresolved,
                Step1Blocker::Incompatible
            ]
        );

        assert!(!f.wizard.continue_to_slots());
        assert_eq!(f.wizard.step(), BookingStep::VehicleAndLocation);
    }

    #[tokio::test]
    async fn test_continue_with_vehicle_makes_no_api_call() {
        let mut f = fixture();
        station_and_location(&mut f).await;
        f.wizard.select_vehicle(7).unwrap();

        assert_eq!(f.wizard.form().battery_type_id(), Some(3));
        assert!(f.wizard.is_booking_data_valid());

        let calls = f.api.total_calls();
        assert!(f.wizard.continue_to_slots());
        assert_eq!(f.wizard.step(), BookingStep::BatterySelection);
        assert_eq!(f.api.total_calls(), calls);
    }

    #[tokio::test]
    async fn test_third_battery_is_rejected_with_warning() {
        let mut f = fixture();
        at_step_two(&mut f).await;

        assert_eq!(f.wizard.toggle_slot(1), SlotToggle::Selected { battery_id: 101 });
        assert_eq!(f.wizard.toggle_slot(2), SlotToggle::Selected { battery_id: 102 });
        assert_eq!(f.wizard.draft().selected_battery_ids(), vec![101, 102]);

        assert_eq!(f.wizard.toggle_slot(3), SlotToggle::LimitReached);
        assert_eq!(f.wizard.draft().booking_details.len(), 2);
        assert_eq!(f.notifier.count(NoticeLevel::Warning), 1);
        assert_eq!(f.notifier.last().unwrap().message, LIMIT_WARNING);
    }

    #[tokio::test]
    async fn test_charging_slot_click_is_silent() {
        let mut f = fixture();
        at_step_two(&mut f).await;

        assert_eq!(f.wizard.toggle_slot(4), SlotToggle::Ignored);
        assert!(f.wizard.draft().booking_details.is_empty());
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_submit_success_resets_and_closes() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);
        let expected = f.wizard.draft().clone();

        let outcome = f.wizard.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Submitted { booking: Some(_), .. }));
        assert_eq!(f.api.create_calls(), 1);
        assert_eq!(f.api.submitted(), vec![expected]);
        assert_eq!(*f.wizard.draft(), BookingDraft::default());
        assert_eq!(f.wizard.step(), BookingStep::VehicleAndLocation);
        assert!(!f.wizard.is_open());
        assert_eq!(f.navigator.routes(), vec![AppRoute::BookingHistory]);
        assert_eq!(f.notifier.count(NoticeLevel::Success), 1);
    }

    #[tokio::test]
    async fn test_rejected_submit_keeps_draft() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(2);
        f.api.set_outcome(CreateOutcome::Reject("Pin 102 vừa được người khác đặt".to_string()));
        let before = f.wizard.draft().clone();

        let outcome = f.wizard.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Rejected { ref message } if message == "Pin 102 vừa được người khác đặt"));
        assert_eq!(*f.wizard.draft(), before);
        assert!(f.wizard.is_open());
        assert!(f.navigator.routes().is_empty());
        assert_eq!(f.notifier.count(NoticeLevel::Error), 1);

        // retry succeeds
        f.api.set_outcome(CreateOutcome::Accept);
        assert!(matches!(f.wizard.submit().await, SubmitOutcome::Submitted { .. }));
        assert_eq!(f.api.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_network_failure_uses_fallback_message() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);
        f.api.set_outcome(CreateOutcome::Unreachable);

        let outcome = f.wizard.submit().await;

        assert!(matches!(outcome, SubmitOutcome::Rejected { ref message } if message == SUBMIT_FALLBACK_ERROR));
        assert_eq!(f.wizard.draft().selected_battery_ids(), vec![101]);
    }

    #[tokio::test]
    async fn test_server_error_message_is_shown() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);
        f.api.set_outcome(CreateOutcome::Fail { status: 409, message: "Bạn đang có lịch đặt chưa hoàn tất".to_string() });

        f.wizard.submit().await;
        assert_eq!(f.notifier.last().unwrap().message, "Bạn đang có lịch đặt chưa hoàn tất");
    }

    #[tokio::test]
    async fn test_submit_without_batteries_sends_nothing() {
        let mut f = fixture();
        at_step_two(&mut f).await;

        assert!(matches!(f.wizard.submit().await, SubmitOutcome::NotReady));
        assert_eq!(f.api.create_calls(), 0);
    }

    #[tokio::test]
    async fn test_stale_geocode_response_is_dropped() {
        let mut f = fixture();
        let older = f.wizard.begin_geocode();
        let newer = f.wizard.begin_geocode();

        let newer_at = Coordinates::new(10.85, 106.75);
        assert!(f.wizard.apply_geocode(newer, Ok(Some(newer_at))));
        assert!(!f.wizard.apply_geocode(older, Ok(Some(HOME))));

        assert_eq!(f.wizard.user_location(), Some(newer_at));
    }

    #[tokio::test]
    async fn test_map_pick_supersedes_pending_geocode() {
        let mut f = fixture();
        f.wizard.set_address("somewhere typed");
        let typed = f.wizard.begin_geocode();

        assert!(f.wizard.pick_location(HOME).await);
        assert_eq!(f.wizard.form().address(), "12 Nguyễn Huệ, Quận 1");

        assert!(!f.wizard.apply_geocode(typed, Ok(Some(Coordinates::new(21.02, 105.83)))));
        assert_eq!(f.wizard.user_location(), Some(HOME));
    }

    #[tokio::test]
    async fn test_geocoding_failure_leaves_location_unset() {
        let mut f = fixture_with(MockBookingApi::new(), MockGeocoder::failing());
        f.wizard.set_address("12 Nguyễn Huệ");

        assert!(!f.wizard.resolve_address().await);
        assert_eq!(f.wizard.user_location(), None);
        assert!(f.notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_address_leaves_location_unset() {
        let mut f = fixture();
        f.wizard.set_address("không tồn tại");
        assert!(!f.wizard.resolve_address().await);
        assert!(!f.wizard.draft().has_location());
    }

    #[tokio::test]
    async fn test_cabinets_need_step_two() {
        let mut f = fixture();
        assert!(matches!(f.wizard.load_cabinets().await, Err(WizardError::WrongStep { .. })));
    }

    #[tokio::test]
    async fn test_stale_cabinet_after_going_back() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        let ticket = f.wizard.begin_cabinet_fetch();
        f.wizard.back_to_vehicle_form();

        let cabinet = Cabinet { id: 99, name: "late".to_string(), station_id: Some(5), battery_type_id: Some(3), slots: vec![] };
        assert!(!f.wizard.apply_cabinet(ticket, Ok(cabinet)).unwrap());
        assert_eq!(f.wizard.picker().open().map(|c| c.id), Some(12));
    }

    #[tokio::test]
    async fn test_unknown_vehicle() {
        let mut f = fixture();
        f.wizard.load_vehicles().await.unwrap();
        assert!(matches!(f.wizard.select_vehicle(8), Err(WizardError::UnknownVehicle(8))));
        assert_eq!(f.wizard.draft().user_vehicle_id, 0);
    }

    #[tokio::test]
    async fn test_close_discards_draft() {
        let mut f = fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);

        f.wizard.close();

        assert!(!f.wizard.is_open());
        assert!(f.wizard.draft().is_empty());
        assert_eq!(f.api.create_calls(), 0);

        f.wizard.reopen();
        assert!(f.wizard.is_open());
        assert_eq!(f.wizard.form().vehicles().len(), 1);
    }

    fn two_station_fixture() -> Fixture {
        let vehicle = Vehicle {
            id: 7,
            name: "Klara S".to_string(),
            license_plate: None,
            vehicle_type: VehicleType { id: 1, name: "Xe máy điện".to_string(), battery_type_id: Some(3), battery_type: None },
        };
        let station = |id: i64, name: &str| Station {
            id,
            name: name.to_string(),
            address: None,
            latitude: 10.7769,
            longitude: 106.7009,
            status: Some("ACTIVE".to_string()),
            battery_type_ids: vec![3],
        };
        let cabinet = |id: i64, station_id: i64, slots: Vec<Slot>| Cabinet {
            id,
            name: format!("Tủ {}", id),
            station_id: Some(station_id),
            battery_type_id: Some(3),
            slots,
        };
        let api = MockBookingApi::new()
            .with_vehicles(vec![vehicle])
            .with_stations(vec![station(5, "Quận 1"), station(6, "Quận 3")])
            .with_cabinet(cabinet(12, 5, vec![slot(1, SlotStatus::Available, Some(101)), slot(2, SlotStatus::Available, Some(102))]))
            .with_cabinet(cabinet(13, 6, vec![slot(7, SlotStatus::Available, Some(201)), slot(8, SlotStatus::Available, Some(202))]));
        fixture_with(api, MockGeocoder::new().with_address("12 Nguyễn Huệ, Quận 1", HOME))
    }

    #[tokio::test]
    async fn test_changing_station_drops_picked_batteries() {
        let mut f = two_station_fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);
        f.wizard.toggle_slot(2);

        // Going back alone keeps the picks
        f.wizard.back_to_vehicle_form();
        assert_eq!(f.wizard.draft().selected_battery_ids(), vec![101, 102]);

        f.wizard.select_station(6).unwrap();
        assert!(f.wizard.draft().booking_details.is_empty());
        assert!(f.wizard.picker().open().is_none());

        assert!(f.wizard.continue_to_slots());
        f.wizard.load_cabinets().await.unwrap();
        assert_eq!(f.wizard.picker().open().map(|c| c.id), Some(13));
        assert_eq!(f.wizard.toggle_slot(7), SlotToggle::Selected { battery_id: 201 });

        assert!(matches!(f.wizard.submit().await, SubmitOutcome::Submitted { .. }));
        let submitted = f.api.submitted();
        assert_eq!(submitted[0].station_id, 6);
        assert_eq!(submitted[0].selected_battery_ids(), vec![201]);
    }

    #[tokio::test]
    async fn test_reselecting_same_station_keeps_picks() {
        let mut f = two_station_fixture();
        at_step_two(&mut f).await;
        f.wizard.toggle_slot(1);
        f.wizard.back_to_vehicle_form();

        f.wizard.select_station(5).unwrap();
        f.wizard.select_vehicle(7).unwrap();
        assert!(f.wizard.continue_to_slots());
        assert_eq!(f.wizard.draft().selected_battery_ids(), vec![101]);
    }

    #[tokio::test]
    async fn test_selection_changes_refused_in_step_two() {
        let mut f = two_station_fixture();
        at_step_two(&mut f).await;

        assert!(matches!(f.wizard.select_station(6), Err(WizardError::WrongStep { .. })));
        assert!(matches!(f.wizard.select_vehicle(7), Err(WizardError::WrongStep { .. })));
        assert_eq!(f.wizard.draft().station_id, 5);
    }
}
