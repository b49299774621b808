//! Netlink State Synchronization
//!
//! Push-based state sync for NetOS Netlink desk controllers: one
//! coordinator bootstraps state over the client's request methods, then
//! merges push events into an immutable snapshot that any number of
//! readers can consume without blocking.
//!
//! # Architecture
//!
//! ```text
//! NetlinkClient events → merge fns → StateStore → subscribers
//!        (push)                      (snapshot)   (reactive)
//! ```
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use netlink_state::{SyncCoordinator, StateChange};
//!
//! let coordinator = SyncCoordinator::new(client);
//! coordinator.setup().await?;
//!
//! // Read the latest snapshot at any time, lock-free.
//! if let Some(snapshot) = coordinator.snapshot() {
//!     for display in snapshot.displays() {
//!         println!("bus {}: {}%", display.bus, display.state.brightness);
//!     }
//! }
//!
//! // React to changes.
//! let mut changes = coordinator.subscribe();
//! while let Ok(change) = changes.recv().await {
//!     if let StateChange::DisplayUpdated { bus } = change {
//!         println!("display {bus} changed");
//!     }
//! }
//!
//! coordinator.shutdown().await;
//! ```
//!
//! A lost connection degrades the coordinator without erasing state: the
//! last snapshot stays readable, [`SyncCoordinator::connection_healthy`]
//! turns false, and a reconnect re-bootstraps automatically.

// Core modules
pub mod coordinator;
pub mod merge;
pub mod model;
pub mod store;

// Command helpers (impl blocks on SyncCoordinator)
mod commands;

// Error types
pub mod error;

// Logging infrastructure
pub mod logging;

// ============================================================================
// Re-exports
// ============================================================================

// Coordinator
pub use coordinator::{ConnectionPhase, CoordinatorConfig, SyncCoordinator};

// Store
pub use store::{SnapshotOrigin, StateChange, StateStore};

// Model types
pub use model::{
    BusId, Desk, DeskState, DeviceInfo, Display, DisplayState, DisplaySummary, PayloadError,
    Snapshot, Switch,
};

// Error types
pub use error::{Result, StateError};

// Logging
pub use logging::{init_logging, init_logging_from_env, LoggingError, LoggingMode};

// ============================================================================
// Prelude
// ============================================================================

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::coordinator::{ConnectionPhase, SyncCoordinator};
    pub use crate::model::{BusId, Desk, Display, DisplaySummary, Snapshot, Switch};
    pub use crate::store::{SnapshotOrigin, StateChange};
    pub use netlink_api::{ClientError, ClientEvent, EventKind, NetlinkClient};
}
