//! Status assembly across both upstream sources.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use serde::Serialize;
use tg_tailscale::{PeerStatus, TailscaleClient, TailscaleStatus, UserProfile};
use tg_wireguard::WireGuardClient;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::deadline::within;
use crate::error::{StatusError, StatusResult};
use crate::format::format_timestamp;
use crate::identity::resolve_self_addresses;
use crate::names::resolve_names;
use crate::peers::TunnelStatus;
use crate::routes::{RouteInfo, resolve_route_info};

/// A report section: the value, or the error text shown in its place.
pub type SectionResult<T> = Result<T, String>;

/// The Tailscale section of the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfStatus {
    /// Stable node ID.
    pub id: String,
    /// Backend state ("Running", "NeedsLogin", ...).
    pub state: String,
    /// First label of the node's DNS name.
    pub device_name: String,
    /// MagicDNS suffix.
    pub tailnet_name: String,
    /// Human-facing tailnet name.
    pub domain_name: String,
    /// IPv4 address as the caller knows this node.
    pub ipv4: Option<Ipv4Addr>,
    /// IPv6 address as the caller knows this node.
    pub ipv6: Option<Ipv6Addr>,
    /// Operating system reported by tailscaled.
    pub operating_system: String,
    /// Tailscale version without build metadata.
    pub version: String,
    /// Owner of this node.
    pub user_profile: UserProfile,
    /// Whether the node is owned by tags.
    pub is_tagged: bool,
    /// ACL tags.
    pub tags: Vec<String>,
    /// RFC 3339 node key expiry.
    pub key_expiry: Option<String>,
    /// Whether the node key has expired.
    pub key_expired: bool,
    /// Whether tailscaled runs with a TUN device.
    pub tun_mode: bool,
    /// Routing view, absent when preferences were unavailable.
    pub route_info: Option<RouteInfo>,
}

/// Result of one status request. Each section fails independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    /// Tailscale section.
    pub tailscale: SectionResult<SelfStatus>,
    /// WireGuard section.
    pub wireguard: SectionResult<TunnelStatus>,
}

/// Builds [`StatusReport`]s from the Tailscale and WireGuard clients.
///
/// Holds no per-request state, so one assembler serves concurrent requests.
pub struct StatusAssembler {
    tailscale: Arc<dyn TailscaleClient>,
    wireguard: Arc<dyn WireGuardClient>,
    device: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for StatusAssembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusAssembler")
            .field("device", &self.device)
            .finish_non_exhaustive()
    }
}

impl StatusAssembler {
    /// Create an assembler reading WireGuard device `device`.
    pub fn new(
        tailscale: Arc<dyn TailscaleClient>,
        wireguard: Arc<dyn WireGuardClient>,
        device: impl Into<String>,
    ) -> Self {
        Self {
            tailscale,
            wireguard,
            device: device.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for handshake ages.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The WireGuard device this assembler reads.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Build the full report for a request from `caller`.
    ///
    /// Both sections are fetched concurrently and every upstream call is
    /// bounded by `deadline`. A failed section carries its error text.
    #[instrument(skip(self, deadline))]
    pub async fn compute_status(&self, deadline: Instant, caller: SocketAddr) -> StatusReport {
        let (tailscale, wireguard) = tokio::join!(
            self.self_status(deadline, caller),
            self.tunnel_status(deadline)
        );

        StatusReport {
            tailscale: tailscale.map_err(|err| {
                warn!(error = %err, "tailscale status unavailable");
                err.to_string()
            }),
            wireguard: wireguard.map_err(|err| {
                warn!(device = %self.device, error = %err, "wireguard status unavailable");
                err.to_string()
            }),
        }
    }

    /// Build the Tailscale section.
    ///
    /// # Errors
    ///
    /// Fails when the status snapshot cannot be fetched in time or has no
    /// self node. Whois, profile and preference failures only degrade the
    /// result.
    pub async fn self_status(
        &self,
        deadline: Instant,
        caller: SocketAddr,
    ) -> StatusResult<SelfStatus> {
        let status = within(deadline, "tailscale status", self.tailscale.status()).await?;
        let self_node = status.self_node.as_ref().ok_or(StatusError::MissingSelfNode)?;
        let client = self.tailscale.as_ref();

        let (addresses, names, route_info) = tokio::join!(
            resolve_self_addresses(client, &self_node.tailscale_ips, caller, deadline),
            resolve_names(client, &status, deadline),
            self.route_info(&status, self_node, deadline),
        );

        Ok(SelfStatus {
            id: self_node.id.clone(),
            state: status.backend_state.clone(),
            device_name: first_segment(&self_node.dns_name, '.').to_string(),
            tailnet_name: names.tailnet_name,
            domain_name: names.domain_name,
            ipv4: addresses.ipv4,
            ipv6: addresses.ipv6,
            operating_system: self_node.os.clone(),
            version: first_segment(&status.version, '-').to_string(),
            user_profile: status.user.get(&self_node.user_id).cloned().unwrap_or_default(),
            is_tagged: self_node.is_tagged(),
            tags: self_node.tags().to_vec(),
            key_expiry: self_node.key_expiry.map(format_timestamp),
            key_expired: self_node.expired,
            tun_mode: status.tun,
            route_info,
        })
    }

    async fn route_info(
        &self,
        status: &TailscaleStatus,
        self_node: &PeerStatus,
        deadline: Instant,
    ) -> Option<RouteInfo> {
        match within(deadline, "tailscale prefs", self.tailscale.prefs()).await {
            Ok(prefs) => Some(resolve_route_info(status, self_node, &prefs)),
            Err(err) => {
                debug!(error = %err, "preferences unavailable, omitting route info");
                None
            }
        }
    }

    /// Build the WireGuard section.
    ///
    /// # Errors
    ///
    /// Fails when the device cannot be read in time.
    pub async fn tunnel_status(&self, deadline: Instant) -> StatusResult<TunnelStatus> {
        let device = within(
            deadline,
            "wireguard device",
            self.wireguard.device(&self.device),
        )
        .await?;
        Ok(TunnelStatus::from_device(&device, self.clock.now()))
    }
}

fn first_segment(text: &str, separator: char) -> &str {
    text.split(separator).next().unwrap_or_default()
}
