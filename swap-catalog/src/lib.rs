pub mod selector;
pub mod stats;

pub use selector::{SelectorError, StationSelector};
pub use stats::SlotStats;
