//! Error types for the state-sync layer.

use netlink_api::ClientError;

/// Errors surfaced by the coordinator's lifecycle operations.
///
/// Event-parse failures never appear here: they are logged and the single
/// update dropped, per the isolation policy.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// Connecting or bootstrapping failed; the client error says how
    #[error("setup failed: {0}")]
    Setup(#[from] ClientError),

    /// `setup` was called while the coordinator is already running
    #[error("coordinator is already running")]
    AlreadyRunning,

    /// The coordinator was shut down, aborting the operation
    #[error("coordinator was shut down")]
    ShutDown,
}

/// Convenience type alias for Results using StateError.
pub type Result<T> = std::result::Result<T, StateError>;
