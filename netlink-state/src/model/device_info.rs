//! Controller identity record

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{as_object, optional_str, require_str, PayloadError};

/// Identity and firmware info for the controller itself.
///
/// Fetched once at bootstrap and replaced wholesale whenever the controller
/// pushes a device-info event (e.g. after a firmware update).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Stable device identifier
    pub device_id: String,
    /// Human-readable name configured on the device
    pub device_name: String,
    /// Hardware model
    pub model: String,
    /// Firmware version
    pub version: String,
    /// Remote API version the firmware speaks
    pub api_version: String,
    /// MAC address, when the controller reports one
    pub mac_address: Option<String>,
}

impl DeviceInfo {
    /// Parse a device-info payload.
    ///
    /// All identity fields are required; only the MAC address is optional.
    pub fn from_payload(payload: &Value) -> Result<Self, PayloadError> {
        let map = as_object(payload)?;
        Ok(Self {
            device_id: require_str(map, "device_id")?.to_string(),
            device_name: require_str(map, "device_name")?.to_string(),
            model: require_str(map, "model")?.to_string(),
            version: require_str(map, "version")?.to_string(),
            api_version: require_str(map, "api_version")?.to_string(),
            mac_address: optional_str(map, "mac_address"),
        })
    }
}
