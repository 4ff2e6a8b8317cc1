//! Error types for the daemon.

use std::net::SocketAddr;

use thiserror::Error;

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;

/// Errors that stop the daemon from starting or serving.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// A required environment variable is not set.
    #[error("environment variable not set: {0}")]
    MissingEnv(&'static str),

    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for environment variable {name}: {reason}")]
    InvalidEnv {
        /// Variable name.
        name: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// Logging could not be initialized.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    /// The listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: SocketAddr,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error.
    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}
