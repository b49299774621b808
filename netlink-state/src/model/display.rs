//! Per-bus display records

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_object, optional_str, require_percent, require_str, BusId, PayloadError, Switch,
};

/// Static descriptor for one display, from the displays-list call/event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySummary {
    /// Which connector the display hangs off
    pub bus: BusId,
    /// Panel model, when reported
    pub model: Option<String>,
    /// Panel type (e.g. "lcd", "projector"), when reported
    pub display_type: Option<String>,
    /// Serial number, when reported
    pub serial_number: Option<String>,
}

impl DisplaySummary {
    /// Parse one entry of a displays-list payload. Only `bus` is required.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let map = as_object(payload)?;
        let bus = map
            .get("bus")
            .and_then(BusId::from_value)
            .ok_or(PayloadError::MissingField("bus"))?;
        Ok(Self {
            bus,
            model: optional_str(map, "model"),
            display_type: optional_str(map, "type"),
            serial_number: optional_str(map, "serial_number"),
        })
    }
}

/// Dynamic state of one display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Panel power
    pub power: Switch,
    /// Backlight brightness, 0-100
    pub brightness: u8,
    /// Speaker volume, 0-100
    pub volume: u8,
    /// Active input source
    pub source: String,
    /// Error reported for this panel, if any
    pub error: Option<String>,
}

/// Full per-bus display record: descriptor, capability map, and live state.
///
/// Display-state events carry complete records; this type rejects partial
/// patches so a bus is always either fully updated or left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    /// Which connector the display hangs off
    pub bus: BusId,
    /// Panel model, when reported
    pub model: Option<String>,
    /// Panel type, when reported
    pub display_type: Option<String>,
    /// Serial number, when reported
    pub serial_number: Option<String>,
    /// Capability name to supported flag, as reported by the panel
    pub supports: BTreeMap<String, bool>,
    /// Input sources this panel can switch between, in panel order
    pub source_options: Vec<String>,
    /// Live panel state
    pub state: DisplayState,
}

impl Display {
    /// Parse a display-state payload.
    ///
    /// Requires `bus`, `power`, `brightness`, `volume` and `source`, the
    /// full state record. A payload carrying only a subset (a partial
    /// patch) is rejected and the previous record survives.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let map = as_object(payload)?;

        let bus = map
            .get("bus")
            .and_then(BusId::from_value)
            .ok_or(PayloadError::MissingField("bus"))?;

        let power = Switch::from_wire(require_str(map, "power")?)
            .ok_or(PayloadError::WrongType("power"))?;

        let supports = map
            .get("supports")
            .and_then(Value::as_object)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|(key, value)| value.as_bool().map(|flag| (key.clone(), flag)))
                    .collect()
            })
            .unwrap_or_default();

        let source_options = map
            .get("source_options")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bus,
            model: optional_str(map, "model"),
            display_type: optional_str(map, "type"),
            serial_number: optional_str(map, "serial_number"),
            supports,
            source_options,
            state: DisplayState {
                power,
                brightness: require_percent(map, "brightness")?,
                volume: require_percent(map, "volume")?,
                source: require_str(map, "source")?.to_string(),
                error: optional_str(map, "error"),
            },
        })
    }

    /// Whether the panel reports support for a capability.
    ///
    /// `None` means the panel never said either way; callers usually treat
    /// that as "worth trying".
    pub fn supports(&self, capability: &str) -> Option<bool> {
        self.supports.get(capability).copied()
    }
}
