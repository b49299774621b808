//! Snapshot store with atomic replace and reactive listeners
//!
//! The StateStore holds the one shared mutable resource of the sync layer:
//! the current [`Snapshot`], kept behind a `tokio::sync::watch` cell as an
//! `Arc` so reads are lock-free and never observe a torn value. Writers go
//! through [`StateStore::update`], which serializes the whole
//! read-modify-replace sequence so two concurrent merges both land.
//!
//! # Architecture
//!
//! ```text
//! merge fns ──update()──▶ watch cell (Arc<Snapshot>) ──▶ current()/watch_snapshot()
//!                  │
//!                  └────▶ broadcast::Sender<StateChange> ──▶ subscribe()
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};

use crate::model::{BusId, Snapshot};

/// Which fetch sequence produced a wholesale snapshot publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOrigin {
    /// The first-load fetch during setup
    Bootstrap,
    /// A post-reconnect refetch
    Rebootstrap,
}

/// Notification fanned out to listeners whenever the store (or the link
/// behind it) changes.
///
/// `ConnectionLost` is the only change that leaves the snapshot untouched:
/// stale-but-present data beats no data, so listeners are told to re-read
/// health, not state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    /// A full snapshot was published by a (re-)bootstrap
    SnapshotReplaced {
        /// Which fetch sequence produced it
        origin: SnapshotOrigin,
    },
    /// The desk record was replaced by an event
    DeskUpdated,
    /// One display's record was replaced by an event
    DisplayUpdated {
        /// The bus that changed
        bus: BusId,
    },
    /// The display summary index was replaced
    DisplaysListed,
    /// The controller's identity record was replaced
    DeviceInfoUpdated,
    /// The push connection dropped; the snapshot is now stale
    ConnectionLost,
    /// The push connection came back
    ConnectionRestored,
}

/// Snapshot holder with atomic replace-and-notify.
pub struct StateStore {
    /// Latest snapshot; `None` until the first bootstrap publish
    snapshot_tx: watch::Sender<Option<Arc<Snapshot>>>,
    /// Serializes every read-modify-replace sequence
    write_lock: Mutex<()>,
    /// Listener fan-out
    changes_tx: broadcast::Sender<StateChange>,
}

impl StateStore {
    /// Create an empty store whose change channel buffers `change_buffer`
    /// notifications per listener.
    pub fn new(change_buffer: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(None);
        let (changes_tx, _) = broadcast::channel(change_buffer);
        Self {
            snapshot_tx,
            write_lock: Mutex::new(()),
            changes_tx,
        }
    }

    /// Latest snapshot, or `None` before bootstrap completes.
    ///
    /// Lock-free: clones an `Arc` out of the watch cell.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.snapshot_tx.borrow().clone()
    }

    /// Atomically publish a complete snapshot and notify listeners.
    pub fn replace(&self, snapshot: Snapshot, change: StateChange) {
        {
            let _guard = self.write_lock.lock();
            self.snapshot_tx.send_replace(Some(Arc::new(snapshot)));
        }
        self.notify(change);
    }

    /// Run one read-modify-replace step under the store's write lock.
    ///
    /// `f` always sees the snapshot that is current *at this instant*,
    /// never a reference captured earlier, so concurrent merges cannot
    /// lose each other's updates. Returning `None` from `f` leaves the
    /// store untouched (the skip path for malformed payloads).
    ///
    /// Returns whether a new snapshot was published.
    pub fn update<F>(&self, f: F) -> bool
    where
        F: FnOnce(Option<&Snapshot>) -> Option<(Snapshot, StateChange)>,
    {
        let published = {
            let _guard = self.write_lock.lock();
            let current = self.snapshot_tx.borrow().clone();
            match f(current.as_deref()) {
                Some((next, change)) => {
                    self.snapshot_tx.send_replace(Some(Arc::new(next)));
                    Some(change)
                }
                None => None,
            }
        };

        match published {
            Some(change) => {
                self.notify(change);
                true
            }
            None => false,
        }
    }

    /// Tell listeners the snapshot went stale without touching it.
    pub fn mark_stale(&self) {
        self.notify(StateChange::ConnectionLost);
    }

    /// Broadcast a change to all listeners.
    pub fn notify(&self, change: StateChange) {
        // Send only fails with zero listeners, which is fine.
        let _ = self.changes_tx.send(change);
    }

    /// Subscribe to change notifications.
    ///
    /// The receiver is the subscription handle: drop it to unsubscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes_tx.subscribe()
    }

    /// Watch the snapshot cell itself (level-triggered consumers).
    pub fn watch_snapshot(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.snapshot_tx.subscribe()
    }
}
