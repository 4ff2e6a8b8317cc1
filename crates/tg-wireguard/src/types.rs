use std::net::SocketAddr;
use std::time::{Duration, SystemTime};

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

/// A WireGuard device as reported by the driver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGuardDevice {
    /// Interface name.
    pub name: String,

    /// Base64 public key, absent when no private key is configured.
    pub public_key: Option<String>,

    /// UDP listen port, absent when unset.
    pub listen_port: Option<u16>,

    /// Firewall mark, absent when unset.
    pub firewall_mark: Option<u32>,

    /// Peers in driver order.
    pub peers: Vec<WireGuardPeer>,
}

/// A WireGuard peer with its runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireGuardPeer {
    /// Base64 public key.
    pub public_key: String,

    /// Current endpoint, if known.
    pub endpoint: Option<SocketAddr>,

    /// Persistent keepalive interval, absent when disabled.
    pub persistent_keepalive_interval: Option<Duration>,

    /// Time of the last completed handshake. Some drivers report the Unix
    /// epoch instead of nothing for a peer that never handshaked.
    pub last_handshake_time: Option<SystemTime>,

    /// Bytes received from the peer.
    pub receive_bytes: u64,

    /// Bytes sent to the peer.
    pub transmit_bytes: u64,

    /// Allowed IP prefixes in driver order.
    pub allowed_ips: Vec<IpNet>,
}
