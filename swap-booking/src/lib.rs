pub mod models;
pub mod draft;
pub mod guard;
pub mod vehicle_form;
pub mod slot_picker;
pub mod wizard;

pub use models::{BookingStep, DraftField, ModalState};
pub use draft::DraftController;
pub use guard::{RequestGeneration, Ticket};
pub use vehicle_form::{Compatibility, CompatibilityCheck, Step1Blocker, VehicleForm};
pub use slot_picker::{SlotPicker, SlotState, SlotToggle};
pub use wizard::{BookingWizard, SubmitOutcome, WizardContext, WizardError};
