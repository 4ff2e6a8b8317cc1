//! Error types for status assembly.

use tg_tailscale::TailscaleError;
use tg_wireguard::WireGuardError;
use thiserror::Error;

/// Result type for status assembly.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors that make a status section unavailable.
#[derive(Debug, Error)]
pub enum StatusError {
    /// The Tailscale daemon could not answer.
    #[error("tailscale: {0}")]
    Tailscale(#[from] TailscaleError),

    /// The WireGuard driver could not answer.
    #[error("wireguard: {0}")]
    WireGuard(#[from] WireGuardError),

    /// An upstream call did not finish before the request deadline.
    #[error("{operation} timed out")]
    Timeout {
        /// Upstream call that was cut off.
        operation: &'static str,
    },

    /// The status snapshot has no self node (backend not logged in).
    #[error("tailscale status has no self node")]
    MissingSelfNode,
}

impl StatusError {
    /// Whether the error is a deadline expiry rather than an upstream failure.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
