//! `LocalAPI` payload types.
//!
//! Field names follow the PascalCase JSON `tailscaled` emits. Go marshals nil
//! slices and maps as `null`, so collection fields accept `null` as empty.

use std::collections::{BTreeMap, HashMap};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, Utc};
use ipnet::IpNet;
use serde::{Deserialize, Deserializer, Serialize};

use crate::addr;

/// Stable node identifier assigned by the control plane.
pub type StableNodeId = String;

/// Control-plane user identifier.
pub type UserId = i64;

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tailnet status from `/localapi/v0/status`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TailscaleStatus {
    /// `tailscaled` version, including any build-metadata suffix.
    #[serde(default)]
    pub version: String,

    /// Whether `tailscaled` runs with a TUN device (as opposed to userspace networking).
    #[serde(rename = "TUN", default)]
    pub tun: bool,

    /// Backend state (e.g., "Running", "Stopped", "NeedsLogin").
    #[serde(default)]
    pub backend_state: String,

    /// This node's information. Absent before the first login.
    #[serde(rename = "Self", default)]
    pub self_node: Option<PeerStatus>,

    /// Peers keyed by node public key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub peer: BTreeMap<String, PeerStatus>,

    /// User profiles keyed by user ID.
    #[serde(default, deserialize_with = "null_as_default")]
    pub user: HashMap<UserId, UserProfile>,

    /// Cached metadata for the current tailnet.
    #[serde(default)]
    pub current_tailnet: Option<TailnetStatus>,

    /// Exit node this node is currently routing through, if any.
    #[serde(default)]
    pub exit_node_status: Option<ExitNodeStatus>,
}

impl TailscaleStatus {
    /// Find a peer by its stable node ID.
    #[must_use]
    pub fn peer_by_id(&self, id: &str) -> Option<&PeerStatus> {
        self.peer.values().find(|peer| peer.id == id)
    }
}

/// Status of a node (self or peer).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PeerStatus {
    /// Stable node ID.
    #[serde(rename = "ID", default)]
    pub id: StableNodeId,

    /// Node public key.
    #[serde(default)]
    pub public_key: String,

    /// Hostname.
    #[serde(default)]
    pub host_name: String,

    /// Fully qualified MagicDNS name, with trailing dot.
    #[serde(rename = "DNSName", default)]
    pub dns_name: String,

    /// Operating system.
    #[serde(rename = "OS", default)]
    pub os: String,

    /// Owning user.
    #[serde(rename = "UserID", default)]
    pub user_id: UserId,

    /// Overlay addresses, in the order the control plane assigned them.
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "null_as_default")]
    pub tailscale_ips: Vec<IpAddr>,

    /// Prefixes the control plane allows this node to route (approved routes included).
    #[serde(rename = "AllowedIPs", default)]
    pub allowed_ips: Option<Vec<IpNet>>,

    /// ACL tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,

    /// Whether this node is online.
    #[serde(default)]
    pub online: bool,

    /// Whether this peer is the currently selected exit node.
    #[serde(default)]
    pub exit_node: bool,

    /// Node key expiry; absent when expiry is disabled.
    #[serde(default)]
    pub key_expiry: Option<DateTime<Utc>>,

    /// Whether the node key has expired.
    #[serde(default)]
    pub expired: bool,
}

impl PeerStatus {
    /// Tags as a slice, empty when the node has none.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    /// Whether the node is owned by tags rather than a user.
    #[must_use]
    pub fn is_tagged(&self) -> bool {
        !self.tags().is_empty()
    }
}

/// Exit node currently in use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExitNodeStatus {
    /// Stable node ID of the exit node.
    #[serde(rename = "ID", default)]
    pub id: StableNodeId,

    /// Whether the exit node is online.
    #[serde(default)]
    pub online: bool,

    /// Overlay prefixes of the exit node.
    #[serde(rename = "TailscaleIPs", default, deserialize_with = "null_as_default")]
    pub tailscale_ips: Vec<IpNet>,
}

/// Cached tailnet metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TailnetStatus {
    /// Tailnet name.
    #[serde(default)]
    pub name: String,

    /// MagicDNS suffix, e.g. `tail1234.ts.net`.
    #[serde(rename = "MagicDNSSuffix", default)]
    pub magic_dns_suffix: String,

    /// Whether MagicDNS is enabled.
    #[serde(rename = "MagicDNSEnabled", default)]
    pub magic_dns_enabled: bool,
}

/// User profile as reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserProfile {
    /// User ID.
    #[serde(rename = "ID", default)]
    pub id: UserId,

    /// Login name, e.g. `alice@example.com`. For display only.
    #[serde(default)]
    pub login_name: String,

    /// Display name, e.g. `Alice Smith`.
    #[serde(default)]
    pub display_name: String,
}

/// Preferences from `/localapi/v0/prefs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Prefs {
    /// Routes this node advertises, exit routes included.
    #[serde(default, deserialize_with = "null_as_default")]
    pub advertise_routes: Vec<IpNet>,

    /// Tags this node requests.
    #[serde(default, deserialize_with = "null_as_default")]
    pub advertise_tags: Vec<String>,

    /// Exit node selected by the user.
    #[serde(rename = "ExitNodeID", default)]
    pub exit_node_id: StableNodeId,

    /// Hostname override.
    #[serde(default)]
    pub hostname: String,

    /// Whether the user wants the backend running.
    #[serde(default)]
    pub want_running: bool,
}

impl Prefs {
    /// Whether the advertised routes include an exit-node default route.
    #[must_use]
    pub fn advertises_exit_node(&self) -> bool {
        self.advertise_routes.iter().any(addr::is_exit_route)
    }
}

/// Response of `/localapi/v0/whois`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhoIsResponse {
    /// The node that owns the looked-up address, as seen from this node.
    #[serde(default)]
    pub node: WhoIsNode,

    /// Owner of that node.
    #[serde(default)]
    pub user_profile: Option<UserProfile>,
}

/// Node record inside a whois response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WhoIsNode {
    /// Numeric node ID.
    #[serde(rename = "ID", default)]
    pub id: i64,

    /// Stable node ID.
    #[serde(rename = "StableID", default)]
    pub stable_id: StableNodeId,

    /// Fully qualified node name.
    #[serde(default)]
    pub name: String,

    /// Overlay prefixes of the node.
    #[serde(default, deserialize_with = "null_as_default")]
    pub addresses: Vec<IpNet>,

    /// IPv4 address this node is known by to that peer, when it differs.
    #[serde(default)]
    pub self_node_v4_masq_addr_for_this_peer: Option<Ipv4Addr>,

    /// IPv6 address this node is known by to that peer, when it differs.
    #[serde(default)]
    pub self_node_v6_masq_addr_for_this_peer: Option<Ipv6Addr>,
}

/// Current login profile from `/localapi/v0/profiles/current`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginProfile {
    /// Local profile ID.
    #[serde(rename = "ID", default)]
    pub id: String,

    /// Profile name (usually the login name).
    #[serde(default)]
    pub name: String,

    /// Network the profile is logged into.
    #[serde(default)]
    pub network_profile: NetworkProfile,

    /// Stable ID of this node in that network.
    #[serde(rename = "NodeID", default)]
    pub node_id: StableNodeId,

    /// Control server URL.
    #[serde(rename = "ControlURL", default)]
    pub control_url: String,

    /// Logged-in user.
    #[serde(default)]
    pub user_profile: UserProfile,
}

/// Network metadata of a login profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkProfile {
    /// MagicDNS suffix of the tailnet.
    #[serde(rename = "MagicDNSName", default)]
    pub magic_dns_name: String,

    /// Tailnet domain name.
    #[serde(default)]
    pub domain_name: String,

    /// Admin-configured display name, if any.
    #[serde(default)]
    pub display_name: String,
}

impl NetworkProfile {
    /// The display name, or the domain name when none is configured.
    #[must_use]
    pub fn display_name_or_default(&self) -> &str {
        if self.display_name.is_empty() {
            &self.domain_name
        } else {
            &self.display_name
        }
    }
}
