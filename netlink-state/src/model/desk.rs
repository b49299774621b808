//! Desk position and mode records

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    as_object, optional_str, require_bool, require_f64, require_str, string_set, PayloadError,
    Switch,
};

/// Dynamic desk state as pushed by the controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeskState {
    /// Current surface height in centimeters
    pub height: f64,
    /// Height the desk is moving toward, in centimeters
    pub target: f64,
    /// Whether the desk is currently moving
    pub moving: bool,
    /// Drive mode as reported (e.g. "manual", "preset")
    pub mode: String,
    /// Move-beep setting
    pub beep: Switch,
    /// Error reported by the motor controller, if any
    pub error: Option<String>,
}

/// The desk half of the controller: feature sets plus live state.
///
/// Replaced wholesale on every successfully parsed desk-state event; a
/// malformed event leaves the previous value untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Desk {
    /// Features this desk supports (e.g. "memory_positions")
    pub capabilities: BTreeSet<String>,
    /// Installed hardware parts as reported by the controller
    pub inventory: BTreeSet<String>,
    /// Live position and mode
    pub state: DeskState,
}

impl Desk {
    /// Parse a desk-state payload.
    ///
    /// `height`, `target`, `moving` and `mode` are required; a payload
    /// missing any of them is rejected whole, never half-applied. `beep`
    /// defaults to off when absent.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let map = as_object(payload)?;

        let beep = match map.get("beep") {
            None | Some(Value::Null) => Switch::default(),
            Some(Value::String(s)) => {
                Switch::from_wire(s).ok_or(PayloadError::WrongType("beep"))?
            }
            Some(_) => return Err(PayloadError::WrongType("beep")),
        };

        Ok(Self {
            capabilities: string_set(map, "capabilities"),
            inventory: string_set(map, "inventory"),
            state: DeskState {
                height: require_f64(map, "height")?,
                target: require_f64(map, "target")?,
                moving: require_bool(map, "moving")?,
                mode: require_str(map, "mode")?.to_string(),
                beep,
                error: optional_str(map, "error"),
            },
        })
    }
}
