//! Connection settings for Netlink client implementations.

/// Connection settings for a Netlink controller.
///
/// The state-sync layer treats this as opaque; only client implementations
/// read it. The token is intentionally excluded from `Debug` output.
#[derive(Clone)]
pub struct ClientConfig {
    /// Hostname or IP of the controller
    pub host: String,
    /// Bearer token for the controller's API
    pub token: String,
    /// Stable device identifier, as reported during pairing
    pub device_id: String,
    /// MAC address of the controller, when known
    pub mac_address: Option<String>,
}

impl ClientConfig {
    /// Create a config for the given controller.
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        device_id: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
            device_id: device_id.into(),
            mac_address: None,
        }
    }

    /// Attach the controller's MAC address.
    pub fn with_mac_address(mut self, mac: impl Into<String>) -> Self {
        self.mac_address = Some(mac.into());
        self
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("device_id", &self.device_id)
            .field("mac_address", &self.mac_address)
            .finish()
    }
}
