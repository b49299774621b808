//! Scripted in-memory client for exercising the state-sync layer.
//!
//! Enabled with the `test-support` cargo feature. Every request method
//! returns whatever was last scripted for it and records the call, so tests
//! can assert both outcomes and traffic (e.g. that a reconnect triggered a
//! fresh bootstrap).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::client::NetlinkClient;
use crate::error::{ClientError, Result};
use crate::event::ClientEvent;

fn unscripted(what: &str) -> ClientError {
    ClientError::Data(format!("{what} not scripted"))
}

#[derive(Default)]
struct Script {
    connect: Option<Result<()>>,
    device_info: Option<Result<Value>>,
    desk_status: Option<Result<Value>>,
    displays: Option<Result<Value>>,
    display_status: HashMap<String, Result<Value>>,
    command_failures: HashMap<String, String>,
    response_delay: Option<Duration>,
}

/// Scripted [`NetlinkClient`] for tests.
///
/// Getters default to a `Data("... not scripted")` error so a test that
/// forgets a fixture fails loudly; `connect` defaults to success.
pub struct MockNetlinkClient {
    script: Mutex<Script>,
    calls: Mutex<Vec<String>>,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl MockNetlinkClient {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            script: Mutex::new(Script::default()),
            calls: Mutex::new(Vec::new()),
            event_tx,
        }
    }

    /// Script the outcome of `connect`.
    pub fn respond_connect(&self, outcome: Result<()>) {
        self.script.lock().connect = Some(outcome);
    }

    /// Script the payload returned by `get_device_info`.
    pub fn respond_device_info(&self, outcome: Result<Value>) {
        self.script.lock().device_info = Some(outcome);
    }

    /// Script the payload returned by `get_desk_status`.
    pub fn respond_desk_status(&self, outcome: Result<Value>) {
        self.script.lock().desk_status = Some(outcome);
    }

    /// Script the payload returned by `get_displays`.
    pub fn respond_displays(&self, outcome: Result<Value>) {
        self.script.lock().displays = Some(outcome);
    }

    /// Script the payload returned by `get_display_status` for one bus.
    pub fn respond_display_status(&self, bus: impl Into<String>, outcome: Result<Value>) {
        self.script.lock().display_status.insert(bus.into(), outcome);
    }

    /// Make the named command setter fail with the given reason.
    pub fn fail_command(&self, command: impl Into<String>, reason: impl Into<String>) {
        self.script
            .lock()
            .command_failures
            .insert(command.into(), reason.into());
    }

    /// Delay every request method by `delay` before answering.
    ///
    /// Used to hold a bootstrap in flight while the test shuts the
    /// coordinator down.
    pub fn set_response_delay(&self, delay: Option<Duration>) {
        self.script.lock().response_delay = delay;
    }

    /// Emit a push event to all current subscribers.
    pub fn emit(&self, event: ClientEvent) {
        // No subscribers is fine; the send result only counts receivers.
        let _ = self.event_tx.send(event);
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    /// How many times a call matching `name` was recorded.
    pub fn call_count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.as_str() == name || call.starts_with(&format!("{name}:")))
            .count()
    }

    /// Forget all recorded calls.
    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().push(call.into());
    }

    async fn pause(&self) {
        let delay = self.script.lock().response_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn command_outcome(&self, command: &str) -> Result<()> {
        match self.script.lock().command_failures.get(command) {
            Some(reason) => Err(ClientError::Command {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl Default for MockNetlinkClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetlinkClient for MockNetlinkClient {
    async fn connect(&self) -> Result<()> {
        self.record("connect");
        self.pause().await;
        self.script.lock().connect.clone().unwrap_or(Ok(()))
    }

    async fn disconnect(&self) {
        self.record("disconnect");
    }

    fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    async fn get_device_info(&self) -> Result<Value> {
        self.record("get_device_info");
        self.pause().await;
        self.script
            .lock()
            .device_info
            .clone()
            .unwrap_or_else(|| Err(unscripted("device_info")))
    }

    async fn get_desk_status(&self) -> Result<Value> {
        self.record("get_desk_status");
        self.pause().await;
        self.script
            .lock()
            .desk_status
            .clone()
            .unwrap_or_else(|| Err(unscripted("desk_status")))
    }

    async fn get_displays(&self) -> Result<Value> {
        self.record("get_displays");
        self.pause().await;
        self.script
            .lock()
            .displays
            .clone()
            .unwrap_or_else(|| Err(unscripted("displays")))
    }

    async fn get_display_status(&self, bus: &str) -> Result<Value> {
        self.record(format!("get_display_status:{bus}"));
        self.pause().await;
        self.script
            .lock()
            .display_status
            .get(bus)
            .cloned()
            .unwrap_or_else(|| Err(unscripted("display_status")))
    }

    async fn set_desk_height(&self, height: f64) -> Result<()> {
        self.record(format!("set_desk_height:{height}"));
        self.command_outcome("set_desk_height")
    }

    async fn set_desk_beep(&self, enabled: bool) -> Result<()> {
        self.record(format!("set_desk_beep:{enabled}"));
        self.command_outcome("set_desk_beep")
    }

    async fn stop_desk(&self) -> Result<()> {
        self.record("stop_desk");
        self.command_outcome("stop_desk")
    }

    async fn reset_desk(&self) -> Result<()> {
        self.record("reset_desk");
        self.command_outcome("reset_desk")
    }

    async fn calibrate_desk(&self) -> Result<()> {
        self.record("calibrate_desk");
        self.command_outcome("calibrate_desk")
    }

    async fn set_display_power(&self, bus: &str, on: bool) -> Result<()> {
        self.record(format!("set_display_power:{bus}:{on}"));
        self.command_outcome("set_display_power")
    }

    async fn set_display_brightness(&self, bus: &str, brightness: u8) -> Result<()> {
        self.record(format!("set_display_brightness:{bus}:{brightness}"));
        self.command_outcome("set_display_brightness")
    }

    async fn set_display_volume(&self, bus: &str, volume: u8) -> Result<()> {
        self.record(format!("set_display_volume:{bus}:{volume}"));
        self.command_outcome("set_display_volume")
    }

    async fn set_display_source(&self, bus: &str, source: &str) -> Result<()> {
        self.record(format!("set_display_source:{bus}:{source}"));
        self.command_outcome("set_display_source")
    }

    async fn refresh_browser(&self) -> Result<()> {
        self.record("refresh_browser");
        self.command_outcome("refresh_browser")
    }
}
