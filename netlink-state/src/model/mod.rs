//! Typed device state records and their payload validation.

mod bus_id;
mod desk;
mod device_info;
mod display;
mod snapshot;
mod switch;

pub use bus_id::BusId;
pub use desk::{Desk, DeskState};
pub use device_info::DeviceInfo;
pub use display::{Display, DisplayState, DisplaySummary};
pub use snapshot::Snapshot;
pub use switch::Switch;

use serde_json::{Map, Value};

/// Why a payload could not be turned into a typed record.
///
/// A failed parse never damages existing state: the caller logs the error
/// and drops that one update.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PayloadError {
    /// The payload root was not a JSON object (or array, where one is required)
    #[error("payload has the wrong shape: expected {0}")]
    WrongShape(&'static str),

    /// A required field was absent
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// A field was present but not of the expected type
    #[error("field `{0}` has the wrong type")]
    WrongType(&'static str),

    /// A numeric field fell outside its allowed range
    #[error("field `{0}` is out of range")]
    OutOfRange(&'static str),
}

pub(crate) fn as_object(payload: &Value) -> Result<&Map<String, Value>, PayloadError> {
    payload
        .as_object()
        .ok_or(PayloadError::WrongShape("object"))
}

pub(crate) fn require_str<'a>(
    map: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, PayloadError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(PayloadError::WrongType(field)),
    }
}

pub(crate) fn require_f64(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<f64, PayloadError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField(field)),
        Some(value) => value.as_f64().ok_or(PayloadError::WrongType(field)),
    }
}

pub(crate) fn require_bool(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<bool, PayloadError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField(field)),
        Some(value) => value.as_bool().ok_or(PayloadError::WrongType(field)),
    }
}

/// Required 0-100 integer, as used for brightness and volume.
pub(crate) fn require_percent(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<u8, PayloadError> {
    match map.get(field) {
        None | Some(Value::Null) => Err(PayloadError::MissingField(field)),
        Some(value) => {
            let raw = value.as_u64().ok_or(PayloadError::WrongType(field))?;
            if raw > 100 {
                return Err(PayloadError::OutOfRange(field));
            }
            Ok(raw as u8)
        }
    }
}

pub(crate) fn optional_str(map: &Map<String, Value>, field: &str) -> Option<String> {
    match map.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}

/// Optional array of strings; non-string entries are skipped.
pub(crate) fn string_set(
    map: &Map<String, Value>,
    field: &str,
) -> std::collections::BTreeSet<String> {
    map.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
