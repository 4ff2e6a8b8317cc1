//! Status reconciliation for the TailGuard gateway.
//!
//! Combines the Tailscale control-plane view of this node with WireGuard
//! peer statistics into one display-ready [`StatusReport`].
//!
//! - [`StatusAssembler`] - Fetches both sources and builds the report
//! - [`resolve_route_info`] - Exit node and subnet route approval
//! - [`SelfAddresses`] - Overlay addresses with per-caller masquerade overrides
//! - [`TailnetNames`] - Tailnet naming with a cached fallback
//! - [`normalize_peer`] - WireGuard peer display records
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use tg_status::StatusAssembler;
//! use tg_tailscale::LocalApiClient;
//! use tg_wireguard::{WgBackend, WgControlClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let assembler = StatusAssembler::new(
//!     Arc::new(LocalApiClient::new()?),
//!     Arc::new(WgControlClient::new(WgBackend::Kernel)),
//!     "wg0",
//! );
//!
//! let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
//! let report = assembler
//!     .compute_status(deadline, "100.64.0.7:52000".parse()?)
//!     .await;
//! if let Err(err) = &report.wireguard {
//!     eprintln!("wireguard unavailable: {err}");
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assemble;
mod clock;
mod deadline;
mod error;
pub mod format;
mod identity;
mod names;
mod peers;
mod routes;

pub use assemble::{SectionResult, SelfStatus, StatusAssembler, StatusReport};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StatusError, StatusResult};
pub use identity::{SelfAddresses, resolve_self_addresses};
pub use names::{TailnetNames, resolve_names};
pub use peers::{ByteCount, PeerView, TunnelStatus, normalize_peer};
pub use routes::{ExitNode, RouteInfo, SubnetRoute, resolve_route_info};
