//! Error types for WireGuard queries.

use thiserror::Error;

/// Result type for WireGuard operations.
pub type WireGuardResult<T> = Result<T, WireGuardError>;

/// Errors that can occur while reading WireGuard state.
#[derive(Debug, Error)]
pub enum WireGuardError {
    /// The interface name is not valid for the platform.
    #[error("invalid interface name {name}: {reason}")]
    InvalidInterface {
        /// Rejected name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The driver query failed (device missing, permission denied, ...).
    #[error("wireguard device query failed for {device}: {source}")]
    DeviceQuery {
        /// Device that was queried.
        device: String,
        /// Underlying driver error.
        #[source]
        source: std::io::Error,
    },

    /// No such device.
    #[error("wireguard device not found: {0}")]
    DeviceNotFound(String),

    /// The blocking query task did not complete.
    #[error("wireguard query task failed: {0}")]
    Task(String),
}
