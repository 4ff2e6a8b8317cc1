//! WireGuard integration for the TailGuard status page.
//!
//! Reads device and peer statistics from the local WireGuard driver. The
//! crate is read-only: it never changes device configuration.
//!
//! - [`WireGuardClient`] - Trait for device queries (mockable for tests)
//! - [`WgControlClient`] - Kernel or userspace (UAPI) backed client
//! - [`MockWireGuardClient`] - In-memory client for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod error;
mod mock;
mod types;

pub use client::{WgBackend, WgControlClient, WireGuardClient};
pub use error::{WireGuardError, WireGuardResult};
pub use mock::MockWireGuardClient;
pub use types::{WireGuardDevice, WireGuardPeer};
