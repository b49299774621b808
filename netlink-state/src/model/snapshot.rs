//! Merged device state at an instant

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{BusId, Desk, Display};

/// The full merged device state at one instant.
///
/// Treated as an immutable value: merge logic clones the current snapshot,
/// overlays one delta, and atomically publishes the result. Readers holding
/// an `Arc<Snapshot>` therefore never observe a half-applied merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Desk state; `None` only before the desk has ever reported
    pub desk: Option<Desk>,
    /// Live display state per bus
    pub displays: BTreeMap<BusId, Display>,
}

impl Snapshot {
    /// Create a new empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Get one display's record by bus
    pub fn display(&self, bus: &BusId) -> Option<&Display> {
        self.displays.get(bus)
    }

    /// All display records in bus order
    pub fn displays(&self) -> impl Iterator<Item = &Display> {
        self.displays.values()
    }

    /// Number of displays with live state
    pub fn display_count(&self) -> usize {
        self.displays.len()
    }

    /// Whether nothing has been reported yet
    pub fn is_empty(&self) -> bool {
        self.desk.is_none() && self.displays.is_empty()
    }
}
