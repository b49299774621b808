//! Error types shared by every Netlink client implementation.

/// Machine-readable reason a device reports for a command it will not run.
///
/// Callers conventionally treat this reason as benign (the command simply
/// does not apply to the attached hardware) rather than as a failure.
pub const UNSUPPORTED_COMMAND: &str = "unsupported_command";

/// Errors that can occur when talking to a Netlink controller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The device rejected the configured token
    #[error("Authentication rejected: {0}")]
    Authentication(String),

    /// The device could not be reached
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A request did not complete in time
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The device answered with something the protocol does not allow
    #[error("Protocol violation: {0}")]
    Protocol(String),

    /// A response or event payload was malformed
    #[error("Malformed payload: {0}")]
    Data(String),

    /// The device refused a command, carrying a machine-readable reason
    #[error("Command rejected: {reason}")]
    Command {
        /// Reason string as reported by the device
        reason: String,
    },
}

impl ClientError {
    /// Whether this is the well-known "unsupported_command" rejection.
    pub fn is_unsupported_command(&self) -> bool {
        matches!(self, ClientError::Command { reason } if reason == UNSUPPORTED_COMMAND)
    }
}

/// Convenience type alias for Results using ClientError.
pub type Result<T> = std::result::Result<T, ClientError>;
