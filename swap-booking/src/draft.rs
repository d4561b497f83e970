use crate::models::{BookingStep, DraftField};
use swap_core::BookingDraft;

/// Owns the booking draft and the current wizard step.
/// Performs no validation: gates live with each step.
#[derive(Debug, Clone)]
pub struct DraftController {
    draft: BookingDraft,
    step: BookingStep,
}

impl DraftController {
    pub fn new() -> Self {
        Self {
            draft: BookingDraft::default(),
            step: BookingStep::VehicleAndLocation,
        }
    }

    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut BookingDraft {
        &mut self.draft
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    /// Merge a single field into the draft
    pub fn set_field(&mut self, field: DraftField) {
        match field {
            DraftField::UserVehicleId(id) => self.draft.user_vehicle_id = id,
            DraftField::StationId(id) => self.draft.station_id = id,
            DraftField::UserLat(lat) => self.draft.user_lat = lat,
            DraftField::UserLng(lng) => self.draft.user_lng = lng,
            DraftField::BookingDetails(details) => self.draft.booking_details = details,
        }
    }

    /// Move to `target`. Callers are responsible for gating.
    pub fn advance_step(&mut self, target: BookingStep) {
        self.step = target;
    }

    /// Back to all-zero defaults on step 1
    pub fn reset(&mut self) {
        self.draft = BookingDraft::default();
        self.step = BookingStep::VehicleAndLocation;
    }
}

impl Default for DraftController {
    fn default() -> Self {
        Self::new()
    }
}
