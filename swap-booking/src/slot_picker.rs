use swap_core::booking::MAX_BATTERIES_PER_BOOKING;
use swap_core::{BookingDetail, BookingDraft, Cabinet, Slot};

/// How a slot renders given the current draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Unselectable,
    Available,
    Selected,
}

/// Result of clicking a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotToggle {
    Selected { battery_id: i64 },
    Deselected { battery_id: i64 },
    /// Slot not available or empty; nothing changed
    Ignored,
    /// Already holding the maximum number of batteries; nothing changed
    LimitReached,
    /// Battery type differs from the vehicle's; nothing changed
    IncompatibleBattery,
    UnknownSlot,
}

/// Step 2 state: the cabinets offered for the chosen station and battery
/// type, and the one currently open with its slots.
#[derive(Debug, Clone, Default)]
pub struct SlotPicker {
    cabinets: Vec<Cabinet>,
    open: Option<Cabinet>,
    required_battery_type: Option<i64>,
}

impl SlotPicker {
    pub fn new(required_battery_type: Option<i64>) -> Self {
        Self {
            cabinets: Vec::new(),
            open: None,
            required_battery_type,
        }
    }

    pub fn set_cabinets(&mut self, cabinets: Vec<Cabinet>) {
        self.cabinets = cabinets;
    }

    pub fn cabinets(&self) -> &[Cabinet] {
        &self.cabinets
    }

    /// Replace the open cabinet with freshly fetched data.
    pub fn open_cabinet(&mut self, cabinet: Cabinet) {
        self.open = Some(cabinet);
    }

    pub fn open(&self) -> Option<&Cabinet> {
        self.open.as_ref()
    }

    pub fn required_battery_type(&self) -> Option<i64> {
        self.required_battery_type
    }

    pub fn slot_state(slot: &Slot, draft: &BookingDraft) -> SlotState {
        if !slot.is_selectable() {
            return SlotState::Unselectable;
        }
        match slot.battery_id {
            Some(battery_id) if draft.contains_battery(battery_id) => SlotState::Selected,
            _ => SlotState::Available,
        }
    }

    /// Slots of the open cabinet with their render state.
    pub fn slot_states<'a>(&'a self, draft: &BookingDraft) -> Vec<(&'a Slot, SlotState)> {
        self.open
            .iter()
            .flat_map(|c| c.slots.iter())
            .map(|slot| (slot, Self::slot_state(slot, draft)))
            .collect()
    }

    /// Click on a slot of the open cabinet.
    pub fn toggle(&self, draft: &mut BookingDraft, slot_id: i64) -> SlotToggle {
        let Some(slot) = self.open.iter().flat_map(|c| c.slots.iter()).find(|s| s.id == slot_id) else {
            return SlotToggle::UnknownSlot;
        };
        let Some(battery_id) = slot.battery_id.filter(|_| slot.is_selectable()) else {
            return SlotToggle::Ignored;
        };

        if draft.contains_battery(battery_id) {
            // By value: every detail carrying this battery goes
            draft.booking_details.retain(|d| d.battery_id != battery_id);
            return SlotToggle::Deselected { battery_id };
        }

        if let (Some(required), Some(actual)) = (self.required_battery_type, slot.battery_type_id()) {
            if required != actual {
                return SlotToggle::IncompatibleBattery;
            }
        }

        if draft.booking_details.len() >= MAX_BATTERIES_PER_BOOKING {
            return SlotToggle::LimitReached;
        }

        draft.booking_details.push(BookingDetail { battery_id });
        SlotToggle::Selected { battery_id }
    }

    /// Step-2 gate: at least one real battery picked.
    pub fn is_valid(draft: &BookingDraft) -> bool {
        !draft.booking_details.is_empty() && draft.booking_details.iter().any(|d| d.battery_id != 0)
    }
}
