//! Two-state on/off value

use serde::{Deserialize, Serialize};
use std::fmt;

/// An on/off toggle as the controller reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Switch {
    /// Feature is active
    On,
    /// Feature is inactive
    Off,
}

impl Switch {
    /// Parse from the controller's "on"/"off" wire strings.
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "on" => Some(Switch::On),
            "off" => Some(Switch::Off),
            _ => None,
        }
    }

    /// Wire form of this value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Switch::On => "on",
            Switch::Off => "off",
        }
    }

    /// Whether this is the on position.
    pub fn is_on(&self) -> bool {
        matches!(self, Switch::On)
    }
}

impl Default for Switch {
    fn default() -> Self {
        Switch::Off
    }
}

impl From<bool> for Switch {
    fn from(on: bool) -> Self {
        if on {
            Switch::On
        } else {
            Switch::Off
        }
    }
}

impl fmt::Display for Switch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
