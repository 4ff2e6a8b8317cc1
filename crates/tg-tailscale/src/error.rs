//! Error types for Tailscale integration.

use thiserror::Error;

/// Result type for Tailscale operations.
pub type TailscaleResult<T> = Result<T, TailscaleError>;

/// Errors that can occur during Tailscale operations.
#[derive(Debug, Error)]
pub enum TailscaleError {
    /// `LocalAPI` request failed.
    #[error("`LocalAPI` request failed: {0}")]
    LocalApiRequest(String),

    /// `LocalAPI` returned an error response.
    #[error("`LocalAPI` error: {0}")]
    LocalApiError(String),

    /// Failed to parse `LocalAPI` response.
    #[error("failed to parse `LocalAPI` response: {0}")]
    ParseError(String),

    /// Node is not connected to tailnet.
    #[error("node is not connected to tailnet")]
    NotConnected,

    /// No peer owns the looked-up address.
    #[error("peer not found: {0}")]
    PeerNotFound(String),

    /// No login profile is active.
    #[error("no current login profile")]
    NoProfile,
}
