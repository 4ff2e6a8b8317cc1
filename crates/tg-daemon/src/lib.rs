//! TailGuard status page daemon.
//!
//! Serves a single HTML page describing the gateway's Tailscale and
//! WireGuard state, built by [`tg_status::StatusAssembler`].
//!
//! - [`config`] - Container environment and epoch marker files
//! - [`server`] - axum router, rate limiting and graceful shutdown
//! - [`render`] - HTML rendering with escaping
//! - [`telemetry`] - `tracing` subscriber setup

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod error;
pub mod ratelimit;
pub mod render;
pub mod server;
pub mod telemetry;

pub use config::{EnvSource, EpochMarkers, ProcessEnv, TailGuardConfig};
pub use error::{DaemonError, DaemonResult};
pub use server::{AppState, router, serve, shutdown_signal};
pub use telemetry::{TelemetryConfig, init_logging};
