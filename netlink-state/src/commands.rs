//! Command helpers on the coordinator
//!
//! Thin pass-throughs to the client's command setters, with the two pieces
//! of policy consumers always want: a display command is skipped when the
//! panel explicitly reports the capability as unsupported, and the device's
//! "unsupported_command" rejection is treated as a benign outcome rather
//! than a failure. Every other error propagates to the caller.

use tracing::{debug, warn};

use netlink_api::Result;

use crate::coordinator::SyncCoordinator;
use crate::model::{BusId, Switch};

fn forgive_unsupported(command: &str, result: Result<()>) -> Result<()> {
    match result {
        Err(err) if err.is_unsupported_command() => {
            warn!(command, "device rejected command as unsupported");
            Ok(())
        }
        other => other,
    }
}

impl SyncCoordinator {
    fn display_supports(&self, bus: &BusId, capability: &str) -> Option<bool> {
        self.snapshot()
            .and_then(|snapshot| snapshot.display(bus).and_then(|d| d.supports(capability)))
    }

    /// Drive the desk to a target height in centimeters.
    pub async fn set_desk_height(&self, height: f64) -> Result<()> {
        forgive_unsupported(
            "set_desk_height",
            self.client().set_desk_height(height).await,
        )
    }

    /// Switch the desk's move beep on or off.
    pub async fn set_desk_beep(&self, beep: Switch) -> Result<()> {
        forgive_unsupported(
            "set_desk_beep",
            self.client().set_desk_beep(beep.is_on()).await,
        )
    }

    /// Stop a desk movement in progress.
    pub async fn stop_desk(&self) -> Result<()> {
        forgive_unsupported("stop_desk", self.client().stop_desk().await)
    }

    /// Reset the desk controller.
    pub async fn reset_desk(&self) -> Result<()> {
        forgive_unsupported("reset_desk", self.client().reset_desk().await)
    }

    /// Run the desk height calibration routine.
    pub async fn calibrate_desk(&self) -> Result<()> {
        forgive_unsupported("calibrate_desk", self.client().calibrate_desk().await)
    }

    /// Reload the controller's kiosk browser.
    pub async fn refresh_browser(&self) -> Result<()> {
        forgive_unsupported("refresh_browser", self.client().refresh_browser().await)
    }

    /// Power one display on or off.
    pub async fn set_display_power(&self, bus: &BusId, power: Switch) -> Result<()> {
        forgive_unsupported(
            "set_display_power",
            self.client()
                .set_display_power(bus.as_str(), power.is_on())
                .await,
        )
    }

    /// Set one display's brightness, skipped when the panel reports the
    /// capability as unsupported.
    pub async fn set_display_brightness(&self, bus: &BusId, brightness: u8) -> Result<()> {
        if self.display_supports(bus, "brightness") == Some(false) {
            debug!(%bus, "display does not support brightness, skipping");
            return Ok(());
        }
        forgive_unsupported(
            "set_display_brightness",
            self.client()
                .set_display_brightness(bus.as_str(), brightness)
                .await,
        )
    }

    /// Set one display's volume, skipped when the panel reports the
    /// capability as unsupported.
    pub async fn set_display_volume(&self, bus: &BusId, volume: u8) -> Result<()> {
        if self.display_supports(bus, "volume") == Some(false) {
            debug!(%bus, "display does not support volume, skipping");
            return Ok(());
        }
        forgive_unsupported(
            "set_display_volume",
            self.client().set_display_volume(bus.as_str(), volume).await,
        )
    }

    /// Switch one display's input source, skipped when the panel reports
    /// the capability as unsupported.
    pub async fn set_display_source(&self, bus: &BusId, source: &str) -> Result<()> {
        if self.display_supports(bus, "source") == Some(false) {
            debug!(%bus, "display does not support source switching, skipping");
            return Ok(());
        }
        forgive_unsupported(
            "set_display_source",
            self.client().set_display_source(bus.as_str(), source).await,
        )
    }
}
