//! Subnet route and exit node resolution.

use ipnet::IpNet;
use serde::Serialize;
use tg_tailscale::addr::{is_all_ipv4, is_all_ipv6, is_exit_route};
use tg_tailscale::{ExitNodeStatus, PeerStatus, Prefs, TailscaleStatus};

/// Routing view of this node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouteInfo {
    /// Exit node this node routes through, if any.
    pub using_exit_node: Option<ExitNode>,
    /// Whether this node advertises a default route.
    pub advertising_exit_node: bool,
    /// Whether control approved this node as an exit node.
    pub advertising_exit_node_approved: bool,
    /// Advertised subnet routes, default routes excluded.
    pub advertised_routes: Vec<SubnetRoute>,
}

/// Upstream exit node in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExitNode {
    /// Stable node ID.
    pub id: String,
    /// DNS name, or address or ID when the peer is unknown.
    pub name: String,
    /// Whether the exit node is online.
    pub online: bool,
}

/// An advertised subnet route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetRoute {
    /// The advertised prefix.
    pub prefix: IpNet,
    /// Whether control approved it.
    pub approved: bool,
}

/// Classify the advertised routes of `self_node` against its approved prefixes.
///
/// Approval is exact prefix equality. Peer and exit node data come from the
/// same `status` snapshot.
#[must_use]
pub fn resolve_route_info(
    status: &TailscaleStatus,
    self_node: &PeerStatus,
    prefs: &Prefs,
) -> RouteInfo {
    let approved_set = self_node.allowed_ips.as_deref().unwrap_or_default();
    let approved = |route: &IpNet| approved_set.contains(route);

    let mut info = RouteInfo {
        advertising_exit_node_approved: approved_set
            .iter()
            .any(|route| is_all_ipv4(route) || is_all_ipv6(route)),
        using_exit_node: status
            .exit_node_status
            .as_ref()
            .map(|exit| resolve_exit_node(status, exit)),
        ..RouteInfo::default()
    };

    for route in &prefs.advertise_routes {
        if is_exit_route(route) {
            info.advertising_exit_node = true;
        } else {
            info.advertised_routes.push(SubnetRoute {
                prefix: *route,
                approved: approved(route),
            });
        }
    }

    info
}

fn resolve_exit_node(status: &TailscaleStatus, exit: &ExitNodeStatus) -> ExitNode {
    let name = status
        .peer_by_id(&exit.id)
        .map(|peer| peer.dns_name.clone())
        .filter(|name| !name.is_empty())
        .or_else(|| exit.tailscale_ips.first().map(|net| net.addr().to_string()))
        .unwrap_or_else(|| exit.id.clone());

    ExitNode {
        id: exit.id.clone(),
        name,
        online: exit.online,
    }
}
