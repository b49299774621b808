//! Display bus identity type

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable identifier for one physical display output on the controller.
///
/// Controllers report the bus as either a bare number or a string; both are
/// normalized to the decimal string form so lookups never miss on
/// representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BusId(String);

impl BusId {
    /// Creates a new BusId from an already-normalized string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Extract a BusId from a raw payload value (string or number).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::new(s.clone())),
            Value::Number(n) => Some(Self::new(n.to_string())),
            _ => None,
        }
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BusId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for BusId {
    fn from(s: &str) -> Self {
        BusId::new(s)
    }
}

impl From<String> for BusId {
    fn from(s: String) -> Self {
        BusId::new(s)
    }
}
