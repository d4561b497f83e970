use serde::Serialize;
use swap_core::{Cabinet, Slot, SlotStatus};

/// Slot counts by status, derived from fetched cabinet data.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct SlotStats {
    pub total: usize,
    pub available: usize,
    /// Available and holding a battery
    pub selectable: usize,
    pub reserved: usize,
    pub charging: usize,
    pub empty: usize,
    pub maintenance: usize,
    pub other: usize,
}

impl SlotStats {
    pub fn from_slots(slots: &[Slot]) -> Self {
        let count = |status: SlotStatus| slots.iter().filter(|s| s.status == status).count();
        Self {
            total: slots.len(),
            available: count(SlotStatus::Available),
            selectable: slots.iter().filter(|s| s.is_selectable()).count(),
            reserved: count(SlotStatus::Reserved),
            charging: count(SlotStatus::Charging),
            empty: count(SlotStatus::Empty),
            maintenance: count(SlotStatus::Maintenance),
            other: count(SlotStatus::Other),
        }
    }

    pub fn from_cabinets(cabinets: &[Cabinet]) -> Self {
        cabinets
            .iter()
            .map(|c| Self::from_slots(&c.slots))
            .fold(Self::default(), |acc, s| acc.merge(s))
    }

    fn merge(self, other: Self) -> Self {
        Self {
            total: self.total + other.total,
            available: self.available + other.available,
            selectable: self.selectable + other.selectable,
            reserved: self.reserved + other.reserved,
            charging: self.charging + other.charging,
            empty: self.empty + other.empty,
            maintenance: self.maintenance + other.maintenance,
            other: self.other + other.other,
        }
    }

    /// Share of slots that can be picked right now, 0.0..=1.0
    pub fn availability(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.selectable as f64 / self.total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: i64, status: SlotStatus, battery_id: Option<i64>) -> Slot {
        Slot { id, name: format!("S{}", id), status, battery_id, battery: None }
    }

    #[test]
    fn test_counts_by_status() {
        let slots = vec![
            slot(1, SlotStatus::Available, Some(101)),
            slot(2, SlotStatus::Available, None),
            slot(3, SlotStatus::Charging, Some(103)),
            slot(4, SlotStatus::Reserved, Some(104)),
            slot(5, SlotStatus::Empty, None),
        ];
        let stats = SlotStats::from_slots(&slots);

        assert_eq!(stats.total, 5);
        assert_eq!(stats.available, 2);
        assert_eq!(stats.selectable, 1);
        assert_eq!(stats.charging, 1);
        assert_eq!(stats.reserved, 1);
        assert_eq!(stats.empty, 1);
        assert!((stats.availability() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_merge_across_cabinets() {
        let cabinets = vec![
            Cabinet {
                id: 1,
                name: "Tủ 1".to_string(),
                station_id: Some(5),
                battery_type_id: Some(3),
                slots: vec![slot(1, SlotStatus::Available, Some(101))],
            },
            Cabinet {
                id: 2,
                name: "Tủ 2".to_string(),
                station_id: Some(5),
                battery_type_id: Some(3),
                slots: vec![slot(2, SlotStatus::Maintenance, None), slot(3, SlotStatus::Available, Some(103))],
            },
        ];
        let stats = SlotStats::from_cabinets(&cabinets);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.selectable, 2);
        assert_eq!(stats.maintenance, 1);
    }

    #[test]
    fn test_empty_cabinet_availability() {
        assert_eq!(SlotStats::default().availability(), 0.0);
    }
}
