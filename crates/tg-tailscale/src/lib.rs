//! Tailscale integration for the TailGuard status page.
//!
//! This crate talks to the local `tailscaled` over its `LocalAPI` and exposes
//! the raw, read-only facts the status core reconciles.
//!
//! # Overview
//!
//! - [`TailscaleClient`] - Trait for `LocalAPI` abstraction (mockable for tests)
//! - [`LocalApiClient`] - HTTP client over the `tailscaled` Unix socket or a TCP URL
//! - [`MockTailscaleClient`] - In-memory client for tests
//! - [`TailscaleStatus`], [`Prefs`], [`WhoIsResponse`], [`LoginProfile`] - `LocalAPI` payloads
//!
//! # Example
//!
//! ```rust,no_run
//! use tg_tailscale::{LocalApiClient, TailscaleClient};
//!
//! # async fn run() -> tg_tailscale::TailscaleResult<()> {
//! let client = LocalApiClient::new()?;
//! let status = client.status().await?;
//! println!("backend state: {}", status.backend_state);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod addr;
mod client;
mod error;
mod mock;
mod types;

pub use client::{LocalApiClient, TailscaleClient};
pub use error::{TailscaleError, TailscaleResult};
pub use mock::MockTailscaleClient;
pub use types::{
    ExitNodeStatus, LoginProfile, NetworkProfile, PeerStatus, Prefs, StableNodeId, TailnetStatus,
    TailscaleStatus, UserId, UserProfile, WhoIsNode, WhoIsResponse,
};

/// Default Tailscale `LocalAPI` socket path.
pub const DEFAULT_LOCALAPI_SOCKET: &str = "/var/run/tailscale/tailscaled.sock";

/// Host name `tailscaled` expects on `LocalAPI` requests.
pub const LOCALAPI_HOST: &str = "local-tailscaled.sock";
