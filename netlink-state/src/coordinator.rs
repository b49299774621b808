//! Sync coordinator - bootstrap, event dispatch, and connection lifecycle
//!
//! The [`SyncCoordinator`] owns the client connection for its lifetime. It
//! bootstraps state with request/response calls once, then keeps the
//! [`StateStore`] current purely from push events; a reconnect triggers a
//! fresh bootstrap to recover anything missed while the link was down.
//!
//! ```text
//! setup(): subscribe ─▶ connect ─▶ bootstrap fetch ─▶ first snapshot ─▶ dispatch task
//! events:  desk/display ─▶ merge fns ─▶ store.update   (inline, delivery order)
//!          connect       ─▶ spawned re-bootstrap       (never stalls dispatch)
//!          disconnect    ─▶ Degraded + mark_stale      (snapshot kept)
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use netlink_api::{ClientError, ClientEvent, EventKind, NetlinkClient};

use crate::error::{Result, StateError};
use crate::merge;
use crate::model::{BusId, DeviceInfo, Display, DisplaySummary, PayloadError, Snapshot};
use crate::store::{SnapshotOrigin, StateChange, StateStore};

/// Where the coordinator currently is in its connection lifecycle.
///
/// `Live ⇄ Degraded` is driven solely by connect/disconnect events (and a
/// failed re-bootstrap); a re-bootstrap passes back through `Bootstrapping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPhase {
    /// Nothing is running: `setup` never completed, failed, or the
    /// coordinator was shut down
    Uninitialized,
    /// A (re-)bootstrap fetch sequence is in flight
    Bootstrapping,
    /// Connected with current state
    Live,
    /// Link lost or refresh failed; serving stale state
    Degraded,
}

/// Configuration for [`SyncCoordinator`]
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Number of change notifications to buffer per listener
    pub change_buffer_size: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            change_buffer_size: 1000,
        }
    }
}

/// Shared state between the coordinator handle, its dispatch task, and any
/// in-flight re-bootstrap task.
pub(crate) struct Inner {
    pub(crate) client: Arc<dyn NetlinkClient>,
    store: StateStore,
    device_info: RwLock<Option<DeviceInfo>>,
    display_summaries: RwLock<BTreeMap<BusId, DisplaySummary>>,
    phase: RwLock<ConnectionPhase>,
    bootstrapped: AtomicBool,
    /// A disconnect (or dropped events) happened since the last bootstrap,
    /// so the next connect event must refetch.
    link_lost: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
}

impl Inner {
    fn is_shut_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    fn set_phase(&self, phase: ConnectionPhase) {
        *self.phase.write() = phase;
    }

    fn phase(&self) -> ConnectionPhase {
        *self.phase.read()
    }
}

/// Orchestrates state synchronization for one Netlink controller.
///
/// Consumers read the latest snapshot synchronously via
/// [`snapshot`](Self::snapshot) and learn about changes through
/// [`subscribe`](Self::subscribe); neither ever blocks on a merge in
/// progress.
///
/// # Example
///
/// ```rust,ignore
/// let coordinator = SyncCoordinator::new(client);
/// coordinator.setup().await?;
///
/// let mut changes = coordinator.subscribe();
/// while let Ok(change) = changes.recv().await {
///     if let Some(snapshot) = coordinator.snapshot() {
///         println!("{change:?}: desk at {:?} cm", snapshot.desk.as_ref().map(|d| d.state.height));
///     }
/// }
/// ```
pub struct SyncCoordinator {
    inner: Arc<Inner>,
    dispatch_task: Mutex<Option<JoinHandle<()>>>,
}

impl SyncCoordinator {
    /// Create a coordinator with default configuration.
    pub fn new(client: Arc<dyn NetlinkClient>) -> Self {
        Self::with_config(client, CoordinatorConfig::default())
    }

    /// Create a coordinator with custom configuration.
    pub fn with_config(client: Arc<dyn NetlinkClient>, config: CoordinatorConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                client,
                store: StateStore::new(config.change_buffer_size),
                device_info: RwLock::new(None),
                display_summaries: RwLock::new(BTreeMap::new()),
                phase: RwLock::new(ConnectionPhase::Uninitialized),
                bootstrapped: AtomicBool::new(false),
                link_lost: AtomicBool::new(false),
                shutdown_tx,
            }),
            dispatch_task: Mutex::new(None),
        }
    }

    /// Connect, bootstrap initial state, and start event dispatch.
    ///
    /// Any failure before the first snapshot publish aborts setup and
    /// surfaces the triggering error; no partial store state is left
    /// behind, and setup may be retried. Returns
    /// [`StateError::AlreadyRunning`] if called while running.
    pub async fn setup(&self) -> Result<()> {
        if self.inner.is_shut_down() {
            return Err(StateError::ShutDown);
        }
        {
            let mut phase = self.inner.phase.write();
            if *phase != ConnectionPhase::Uninitialized {
                return Err(StateError::AlreadyRunning);
            }
            *phase = ConnectionPhase::Bootstrapping;
        }

        // Subscribe before connect: events raised during the handshake are
        // buffered in the channel instead of lost.
        let events = self.inner.client.subscribe();

        if let Err(err) = self.inner.client.connect().await {
            self.inner.set_phase(ConnectionPhase::Uninitialized);
            return Err(err.into());
        }

        if let Err(err) = run_bootstrap(&self.inner, SnapshotOrigin::Bootstrap).await {
            if !matches!(err, StateError::ShutDown) {
                self.inner.set_phase(ConnectionPhase::Uninitialized);
            }
            return Err(err);
        }

        self.inner.bootstrapped.store(true, Ordering::SeqCst);

        let inner = Arc::clone(&self.inner);
        *self.dispatch_task.lock() = Some(tokio::spawn(dispatch_loop(inner, events)));

        info!("coordinator live");
        Ok(())
    }

    /// Stop event dispatch and disconnect the client.
    ///
    /// Idempotent: a second call, or a call before `setup`, does nothing.
    /// A bootstrap still in flight has its results discarded.
    pub async fn shutdown(&self) {
        if self.inner.shutdown_tx.send_replace(true) {
            return;
        }
        let handle = self.dispatch_task.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.inner.client.disconnect().await;
        self.inner.set_phase(ConnectionPhase::Uninitialized);
        debug!("coordinator shut down");
    }

    /// Latest snapshot, or `None` before bootstrap completes.
    pub fn snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.store.current()
    }

    /// Controller identity, once fetched.
    pub fn device_info(&self) -> Option<DeviceInfo> {
        self.inner.device_info.read().clone()
    }

    /// Static display descriptors by bus, as last listed.
    pub fn display_summaries(&self) -> BTreeMap<BusId, DisplaySummary> {
        self.inner.display_summaries.read().clone()
    }

    /// Current lifecycle phase.
    pub fn connection_phase(&self) -> ConnectionPhase {
        self.inner.phase()
    }

    /// Whether the coordinator is live with current state.
    pub fn connection_healthy(&self) -> bool {
        self.inner.phase() == ConnectionPhase::Live
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver is the subscription handle: drop it to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.inner.store.subscribe()
    }

    /// Watch the snapshot cell itself (level-triggered consumers).
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.store.watch_snapshot()
    }

    /// The underlying client, for callers that need the raw contract.
    pub fn client(&self) -> Arc<dyn NetlinkClient> {
        Arc::clone(&self.inner.client)
    }

    /// Serializable dump of everything the coordinator knows, for support
    /// bundles. Never contains credentials (the coordinator holds none).
    pub fn diagnostics(&self) -> Value {
        let snapshot = self.snapshot();
        json!({
            "device_info": self.device_info(),
            "display_summaries": self.display_summaries(),
            "snapshot": snapshot.as_deref(),
            "connection": {
                "phase": self.connection_phase(),
                "healthy": self.connection_healthy(),
                "bootstrapped": self.inner.bootstrapped.load(Ordering::SeqCst),
            },
        })
    }
}

impl Drop for SyncCoordinator {
    fn drop(&mut self) {
        // Stops the dispatch task; the client disconnects when its own
        // owner drops it.
        let _ = self.inner.shutdown_tx.send_replace(true);
    }
}

fn data_err(err: PayloadError) -> StateError {
    StateError::Setup(ClientError::Data(err.to_string()))
}

/// One full fetch sequence: device info, desk, display list, then each
/// display's status best-effort. Publishes a complete snapshot on success.
async fn run_bootstrap(inner: &Arc<Inner>, origin: SnapshotOrigin) -> Result<()> {
    inner.set_phase(ConnectionPhase::Bootstrapping);

    let info_payload = inner.client.get_device_info().await?;
    let info = merge::parse_device_info(&info_payload).map_err(data_err)?;

    let desk_payload = inner.client.get_desk_status().await?;
    let desk = crate::model::Desk::from_payload(&desk_payload).map_err(data_err)?;

    let list_payload = inner.client.get_displays().await?;
    let summaries = merge::parse_display_list(&list_payload).map_err(data_err)?;

    // Displays are independently degradable: one bad panel never aborts
    // the bootstrap, it is just left out of the snapshot.
    let mut displays = BTreeMap::new();
    for summary in &summaries {
        match inner.client.get_display_status(summary.bus.as_str()).await {
            Ok(payload) => match Display::from_payload(&payload) {
                Ok(display) => {
                    displays.insert(display.bus.clone(), display);
                }
                Err(err) => {
                    warn!(bus = %summary.bus, "skipping display with malformed status: {err}");
                }
            },
            Err(err) => {
                warn!(bus = %summary.bus, "failed to get display status: {err}");
            }
        }
    }

    if inner.is_shut_down() {
        debug!("discarding bootstrap results after shutdown");
        return Err(StateError::ShutDown);
    }

    *inner.device_info.write() = Some(info);
    *inner.display_summaries.write() = summaries
        .into_iter()
        .map(|summary| (summary.bus.clone(), summary))
        .collect();

    let snapshot = Snapshot {
        desk: Some(desk),
        displays,
    };
    inner
        .store
        .replace(snapshot, StateChange::SnapshotReplaced { origin });
    inner.set_phase(ConnectionPhase::Live);
    Ok(())
}

/// Consumes the client's event channel until shutdown or channel close.
async fn dispatch_loop(inner: Arc<Inner>, mut events: broadcast::Receiver<ClientEvent>) {
    let mut shutdown = inner.shutdown_tx.subscribe();
    debug!("event dispatch started");
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
            event = events.recv() => match event {
                Ok(event) => handle_event(&inner, event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Updates were dropped; the next connect event refetches.
                    inner.link_lost.store(true, Ordering::SeqCst);
                    warn!(missed, "event channel lagged, updates dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("event channel closed");
                    break;
                }
            }
        }
    }
    debug!("event dispatch stopped");
}

/// The event dispatch table: one merge rule per event kind.
///
/// Merges run inline (they are cheap and must apply in delivery order); the
/// reconnect re-bootstrap is the one handler that awaits, so it runs as its
/// own task. A malformed payload only ever suppresses its own update.
fn handle_event(inner: &Arc<Inner>, event: ClientEvent) {
    match event.kind {
        EventKind::Connected => on_connected(inner),
        EventKind::Disconnected => on_disconnected(inner),
        EventKind::DeviceInfo => on_device_info(inner, &event.payload),
        EventKind::DeskState => on_desk_state(inner, &event.payload),
        EventKind::DisplayState => on_display_state(inner, &event.payload),
        EventKind::DisplaysList => on_displays_list(inner, &event.payload),
    }
}

fn on_connected(inner: &Arc<Inner>) {
    if !inner.bootstrapped.load(Ordering::SeqCst) {
        // First connect: setup's own bootstrap covers it.
        return;
    }
    if !inner.link_lost.swap(false, Ordering::SeqCst) {
        // Transports may replay a connect event from the original
        // handshake; without a disconnect in between there is no gap to
        // recover from.
        debug!("connect event without preceding disconnect, nothing to recover");
        return;
    }
    info!("push connection restored, re-bootstrapping");
    inner.store.notify(StateChange::ConnectionRestored);

    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        match run_bootstrap(&inner, SnapshotOrigin::Rebootstrap).await {
            Ok(()) => info!("re-bootstrap complete"),
            Err(StateError::ShutDown) => debug!("re-bootstrap discarded after shutdown"),
            Err(err) => {
                warn!("re-bootstrap failed: {err}");
                // Retry on the next connect event.
                inner.link_lost.store(true, Ordering::SeqCst);
                inner.set_phase(ConnectionPhase::Degraded);
            }
        }
    });
}

fn on_disconnected(inner: &Arc<Inner>) {
    warn!("push connection lost, serving stale state");
    inner.link_lost.store(true, Ordering::SeqCst);
    inner.set_phase(ConnectionPhase::Degraded);
    inner.store.mark_stale();
}

fn on_device_info(inner: &Arc<Inner>, payload: &Value) {
    match merge::parse_device_info(payload) {
        Ok(info) => {
            *inner.device_info.write() = Some(info);
            inner.store.notify(StateChange::DeviceInfoUpdated);
        }
        // Identity is structurally required, so this is an error, not a skip.
        Err(err) => error!("malformed device info event: {err}"),
    }
}

fn on_desk_state(inner: &Arc<Inner>, payload: &Value) {
    inner
        .store
        .update(|current| match merge::merge_desk_state(current, payload) {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!("skipping incomplete desk state: {err}");
                None
            }
        });
}

fn on_display_state(inner: &Arc<Inner>, payload: &Value) {
    inner
        .store
        .update(|current| match merge::merge_display_state(current, payload) {
            Ok(pair) => Some(pair),
            Err(err) => {
                warn!("skipping incomplete display state: {err}");
                None
            }
        });
}

fn on_displays_list(inner: &Arc<Inner>, payload: &Value) {
    match merge::parse_display_list(payload) {
        Ok(summaries) => {
            *inner.display_summaries.write() = summaries
                .into_iter()
                .map(|summary| (summary.bus.clone(), summary))
                .collect();
            inner.store.notify(StateChange::DisplaysListed);
        }
        Err(err) => warn!("skipping malformed displays list: {err}"),
    }
}
