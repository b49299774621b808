//! Push event envelope delivered by Netlink clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The kinds of push events a Netlink controller emits.
///
/// `Connected` and `Disconnected` describe the client's own link; the rest
/// carry partial device state. Wire names match the controller's event
/// channel verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// The push connection was (re)established
    #[serde(rename = "connect")]
    Connected,
    /// The push connection dropped
    #[serde(rename = "disconnect")]
    Disconnected,
    /// Controller identity and firmware info changed
    DeviceInfo,
    /// Desk position/mode update
    DeskState,
    /// One display's state update
    DisplayState,
    /// The set of attached displays changed
    DisplaysList,
}

impl EventKind {
    /// Wire name of this event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Connected => "connect",
            EventKind::Disconnected => "disconnect",
            EventKind::DeviceInfo => "device_info",
            EventKind::DeskState => "desk_state",
            EventKind::DisplayState => "display_state",
            EventKind::DisplaysList => "displays_list",
        }
    }

    /// Parse a wire name into an event kind.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "connect" => Some(EventKind::Connected),
            "disconnect" => Some(EventKind::Disconnected),
            "device_info" => Some(EventKind::DeviceInfo),
            "desk_state" => Some(EventKind::DeskState),
            "display_state" => Some(EventKind::DisplayState),
            "displays_list" => Some(EventKind::DisplaysList),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One push event as received from the controller.
///
/// The payload is kept raw: validation and typing happen in the state layer,
/// which decides per event kind whether a malformed payload is skippable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientEvent {
    /// What kind of event this is
    pub kind: EventKind,
    /// Raw payload as delivered; an empty object for link events
    pub payload: Value,
}

impl ClientEvent {
    /// Create an event carrying a payload.
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    /// A link-established event (empty payload).
    pub fn connected() -> Self {
        Self::new(EventKind::Connected, Value::Object(Default::default()))
    }

    /// A link-lost event (empty payload).
    pub fn disconnected() -> Self {
        Self::new(EventKind::Disconnected, Value::Object(Default::default()))
    }
}
