//! Self address resolution with per-caller masquerade overrides.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::Serialize;
use tg_tailscale::{TailscaleClient, WhoIsNode};
use tokio::time::Instant;
use tracing::debug;

use crate::deadline::within;

/// This node's overlay addresses as the caller should see them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelfAddresses {
    /// IPv4 overlay address.
    pub ipv4: Option<Ipv4Addr>,
    /// IPv6 overlay address.
    pub ipv6: Option<Ipv6Addr>,
}

impl SelfAddresses {
    /// First IPv4 and first IPv6 address of `addrs`, in list order.
    #[must_use]
    pub fn native(addrs: &[IpAddr]) -> Self {
        let mut found = Self::default();
        for addr in addrs {
            match addr {
                IpAddr::V4(v4) if found.ipv4.is_none() => found.ipv4 = Some(*v4),
                IpAddr::V6(v6) if found.ipv6.is_none() => found.ipv6 = Some(*v6),
                _ => {}
            }
            if found.ipv4.is_some() && found.ipv6.is_some() {
                break;
            }
        }
        found
    }

    /// Replace each family with the address the caller knows this node by,
    /// when the caller's node reports one.
    #[must_use]
    pub fn with_masquerade(self, caller_node: &WhoIsNode) -> Self {
        Self {
            ipv4: caller_node.self_node_v4_masq_addr_for_this_peer.or(self.ipv4),
            ipv6: caller_node.self_node_v6_masq_addr_for_this_peer.or(self.ipv6),
        }
    }
}

/// Resolve this node's addresses for `caller`.
///
/// IPv4-mapped callers from a dual-stack listener are looked up by their
/// IPv4 address. A failed or timed out whois lookup keeps the native
/// addresses.
pub async fn resolve_self_addresses(
    client: &dyn TailscaleClient,
    self_ips: &[IpAddr],
    caller: SocketAddr,
    deadline: Instant,
) -> SelfAddresses {
    let native = SelfAddresses::native(self_ips);
    let caller = SocketAddr::new(caller.ip().to_canonical(), caller.port());
    match within(deadline, "whois", client.whois(caller)).await {
        Ok(whois) => native.with_masquerade(&whois.node),
        Err(err) => {
            debug!(caller = %caller, error = %err, "whois lookup failed, using native addresses");
            native
        }
    }
}
