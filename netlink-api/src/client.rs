//! The `NetlinkClient` trait: the contract every transport implements.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::event::ClientEvent;

/// Async contract for talking to a Netlink controller.
///
/// Request methods return raw `serde_json::Value` payloads; the state layer
/// owns validation and typing, so a transport never has to understand the
/// device schema. Implementations are expected to be cheap to share
/// (`Arc<dyn NetlinkClient>`).
///
/// # Contract notes
///
/// - `connect` fails with [`ClientError::Authentication`],
///   [`ClientError::Connection`], [`ClientError::Timeout`] or
///   [`ClientError::Protocol`], each distinct and none retried at this layer.
/// - `disconnect` is idempotent; disconnecting a never-connected client is
///   not an error.
/// - `subscribe` may be called any number of times; each receiver sees every
///   event from the point of subscription. Subscribe before `connect` to
///   observe events raised during the handshake.
/// - Command setters fail with [`ClientError::Command`] carrying the
///   device's reason string.
///
/// [`ClientError::Authentication`]: crate::ClientError::Authentication
/// [`ClientError::Connection`]: crate::ClientError::Connection
/// [`ClientError::Timeout`]: crate::ClientError::Timeout
/// [`ClientError::Protocol`]: crate::ClientError::Protocol
/// [`ClientError::Command`]: crate::ClientError::Command
#[async_trait]
pub trait NetlinkClient: Send + Sync {
    /// Open the push connection and authenticate.
    async fn connect(&self) -> Result<()>;

    /// Close the push connection. Idempotent.
    async fn disconnect(&self);

    /// Obtain a receiver for push events.
    fn subscribe(&self) -> broadcast::Receiver<ClientEvent>;

    /// Fetch controller identity and firmware info.
    async fn get_device_info(&self) -> Result<Value>;

    /// Fetch the current desk status record.
    async fn get_desk_status(&self) -> Result<Value>;

    /// Fetch the list of attached displays (array payload).
    async fn get_displays(&self) -> Result<Value>;

    /// Fetch one display's full status record.
    async fn get_display_status(&self, bus: &str) -> Result<Value>;

    /// Drive the desk to a target height in centimeters.
    async fn set_desk_height(&self, height: f64) -> Result<()>;

    /// Enable or disable the desk's move beep.
    async fn set_desk_beep(&self, enabled: bool) -> Result<()>;

    /// Stop a desk movement in progress.
    async fn stop_desk(&self) -> Result<()>;

    /// Reset the desk controller.
    async fn reset_desk(&self) -> Result<()>;

    /// Run the desk height calibration routine.
    async fn calibrate_desk(&self) -> Result<()>;

    /// Power one display on or off.
    async fn set_display_power(&self, bus: &str, on: bool) -> Result<()>;

    /// Set one display's brightness (0-100).
    async fn set_display_brightness(&self, bus: &str, brightness: u8) -> Result<()>;

    /// Set one display's volume (0-100).
    async fn set_display_volume(&self, bus: &str, volume: u8) -> Result<()>;

    /// Switch one display's input source.
    async fn set_display_source(&self, bus: &str, source: &str) -> Result<()>;

    /// Reload the controller's kiosk browser.
    async fn refresh_browser(&self) -> Result<()>;
}
