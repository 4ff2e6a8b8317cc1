//! WireGuard peer normalization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tg_wireguard::{WireGuardDevice, WireGuardPeer};

use crate::format::{
    format_bytes, format_duration, format_interval, format_timestamp, handshake_time,
};

/// A byte counter with its display form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ByteCount {
    /// Raw count.
    pub bytes: u64,
    /// [`format_bytes`] of the same count.
    pub formatted: String,
}

impl ByteCount {
    /// Pair a count with its formatted text.
    #[must_use]
    pub fn new(bytes: u64) -> Self {
        Self {
            bytes,
            formatted: format_bytes(bytes),
        }
    }
}

/// A WireGuard peer ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerView {
    /// Base64 public key.
    pub public_key: String,
    /// `ip:port` of the current endpoint.
    pub endpoint: Option<String>,
    /// Persistent keepalive interval, absent when disabled.
    pub keepalive_interval: Option<String>,
    /// RFC 3339 time of the last handshake, absent if there was none.
    pub last_handshake_time: Option<String>,
    /// Time since the last handshake, absent if there was none.
    pub last_handshake_ago: Option<String>,
    /// Bytes received from the peer.
    pub receive_bytes: ByteCount,
    /// Bytes sent to the peer.
    pub transmit_bytes: ByteCount,
    /// Allowed prefixes in driver order.
    pub allowed_prefixes: Vec<String>,
}

/// The WireGuard section of the status report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TunnelStatus {
    /// Interface name.
    pub device_name: String,
    /// Base64 public key of the interface.
    pub public_key: Option<String>,
    /// UDP listen port.
    pub listen_port: Option<u16>,
    /// Firewall mark.
    pub firewall_mark: Option<u32>,
    /// Peers in driver order.
    pub peers: Vec<PeerView>,
}

impl TunnelStatus {
    /// Normalize a device and all of its peers against `now`.
    #[must_use]
    pub fn from_device(device: &WireGuardDevice, now: DateTime<Utc>) -> Self {
        Self {
            device_name: device.name.clone(),
            public_key: device.public_key.clone(),
            listen_port: device.listen_port,
            firewall_mark: device.firewall_mark,
            peers: device
                .peers
                .iter()
                .map(|peer| normalize_peer(peer, now))
                .collect(),
        }
    }
}

/// Convert a driver peer record into a [`PeerView`].
///
/// A peer that never completed a handshake gets neither a handshake time nor
/// an age.
#[must_use]
pub fn normalize_peer(peer: &WireGuardPeer, now: DateTime<Utc>) -> PeerView {
    let handshake = handshake_time(peer.last_handshake_time);

    PeerView {
        public_key: peer.public_key.clone(),
        endpoint: peer.endpoint.map(|endpoint| endpoint.to_string()),
        keepalive_interval: peer.persistent_keepalive_interval.map(format_interval),
        last_handshake_time: handshake.map(format_timestamp),
        last_handshake_ago: handshake.map(|at| format_duration(now - at)),
        receive_bytes: ByteCount::new(peer.receive_bytes),
        transmit_bytes: ByteCount::new(peer.transmit_bytes),
        allowed_prefixes: peer.allowed_ips.iter().map(ToString::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use chrono::TimeDelta;

    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_717_243_200, 0).unwrap()
    }

    fn peer() -> WireGuardPeer {
        WireGuardPeer {
            public_key: "cGVlci1vbmU=".to_string(),
            endpoint: Some("198.51.100.7:51820".parse().unwrap()),
            persistent_keepalive_interval: Some(Duration::from_secs(25)),
            last_handshake_time: Some(SystemTime::from(now() - TimeDelta::seconds(332))),
            receive_bytes: 1536,
            transmit_bytes: 512,
            allowed_ips: vec!["10.8.0.2/32".parse().unwrap(), "fd00::2/128".parse().unwrap()],
        }
    }

    #[test]
    fn handshaked_peer_has_time_and_age() {
        let view = normalize_peer(&peer(), now());

        assert_eq!(view.endpoint.as_deref(), Some("198.51.100.7:51820"));
        assert_eq!(view.keepalive_interval.as_deref(), Some("25s"));
        assert_eq!(view.last_handshake_time.as_deref(), Some("2024-06-01T11:54:28Z"));
        assert_eq!(view.last_handshake_ago.as_deref(), Some("5m32s"));
        assert_eq!(view.allowed_prefixes, ["10.8.0.2/32", "fd00::2/128"]);
    }

    #[test]
    fn never_handshaked_peer_has_no_age() {
        for never in [None, Some(SystemTime::UNIX_EPOCH)] {
            let view = normalize_peer(
                &WireGuardPeer {
                    last_handshake_time: never,
                    ..peer()
                },
                now(),
            );
            assert_eq!(view.last_handshake_time, None);
            assert_eq!(view.last_handshake_ago, None);
        }
    }

    #[test]
    fn counters_agree_with_formatting() {
        let view = normalize_peer(&peer(), now());
        assert_eq!(view.receive_bytes.bytes, 1536);
        assert_eq!(view.receive_bytes.formatted, "1.50 KiB");
        assert_eq!(view.transmit_bytes.formatted, format_bytes(view.transmit_bytes.bytes));
    }

    #[test]
    fn disabled_keepalive_and_missing_endpoint_are_absent() {
        let view = normalize_peer(
            &WireGuardPeer {
                endpoint: None,
                persistent_keepalive_interval: None,
                ..peer()
            },
            now(),
        );
        assert_eq!(view.endpoint, None);
        assert_eq!(view.keepalive_interval, None);
    }

    #[test]
    fn device_keeps_peer_order() {
        let device = WireGuardDevice {
            name: "wg0".to_string(),
            public_key: Some("c2VydmVy".to_string()),
            listen_port: Some(51820),
            firewall_mark: None,
            peers: vec![
                WireGuardPeer {
                    public_key: "b".to_string(),
                    ..peer()
                },
                WireGuardPeer {
                    public_key: "a".to_string(),
                    ..peer()
                },
            ],
        };

        let status = TunnelStatus::from_device(&device, now());
        assert_eq!(status.device_name, "wg0");
        let keys: Vec<&str> = status.peers.iter().map(|p| p.public_key.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }
}
