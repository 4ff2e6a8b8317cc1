//! WireGuard device query abstraction.

use std::time::Duration;

use async_trait::async_trait;
use ipnet::IpNet;
use tracing::{instrument, warn};
use wireguard_control::{AllowedIp, Backend, Device, InterfaceName, InvalidInterfaceName};

use crate::error::{WireGuardError, WireGuardResult};
use crate::types::{WireGuardDevice, WireGuardPeer};

/// Trait for WireGuard status sources.
#[async_trait]
pub trait WireGuardClient: Send + Sync {
    /// Read the named device and its peers.
    async fn device(&self, name: &str) -> WireGuardResult<WireGuardDevice>;
}

/// Which driver interface to query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WgBackend {
    /// Kernel module over netlink. Falls back to userspace off Linux.
    #[default]
    Kernel,
    /// Userspace implementation over its UAPI socket.
    Userspace,
}

impl WgBackend {
    const fn driver(self) -> Backend {
        match self {
            #[cfg(target_os = "linux")]
            Self::Kernel => Backend::Kernel,
            #[cfg(not(target_os = "linux"))]
            Self::Kernel => Backend::Userspace,
            Self::Userspace => Backend::Userspace,
        }
    }
}

/// Client backed by `wireguard-control`.
///
/// Driver queries are blocking, so each runs on the blocking thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgControlClient {
    backend: WgBackend,
}

impl WgControlClient {
    /// Create a client for the given backend.
    #[must_use]
    pub const fn new(backend: WgBackend) -> Self {
        Self { backend }
    }

    /// The backend this client queries.
    #[must_use]
    pub const fn backend(&self) -> WgBackend {
        self.backend
    }
}

#[async_trait]
impl WireGuardClient for WgControlClient {
    #[instrument(skip(self))]
    async fn device(&self, name: &str) -> WireGuardResult<WireGuardDevice> {
        let iface: InterfaceName = name.parse().map_err(|err: InvalidInterfaceName| {
            WireGuardError::InvalidInterface {
                name: name.to_string(),
                reason: err.to_string(),
            }
        })?;
        let backend = self.backend.driver();
        let device_name = name.to_string();

        let device = tokio::task::spawn_blocking(move || Device::get(&iface, backend))
            .await
            .map_err(|err| WireGuardError::Task(err.to_string()))?
            .map_err(|source| {
                if source.kind() == std::io::ErrorKind::NotFound {
                    WireGuardError::DeviceNotFound(device_name.clone())
                } else {
                    WireGuardError::DeviceQuery {
                        device: device_name.clone(),
                        source,
                    }
                }
            })?;

        Ok(convert_device(device_name, device))
    }
}

fn convert_device(name: String, device: Device) -> WireGuardDevice {
    let peers = device
        .peers
        .into_iter()
        .map(|peer| WireGuardPeer {
            public_key: peer.config.public_key.to_base64(),
            endpoint: peer.config.endpoint,
            persistent_keepalive_interval: keepalive_interval(
                peer.config.persistent_keepalive_interval,
            ),
            last_handshake_time: peer.stats.last_handshake_time,
            receive_bytes: peer.stats.rx_bytes,
            transmit_bytes: peer.stats.tx_bytes,
            allowed_ips: allowed_prefixes(&peer.config.allowed_ips),
        })
        .collect();

    WireGuardDevice {
        name,
        public_key: device.public_key.map(|key| key.to_base64()),
        listen_port: device.listen_port,
        firewall_mark: device.fwmark,
        peers,
    }
}

fn keepalive_interval(seconds: Option<u16>) -> Option<Duration> {
    seconds
        .filter(|secs| *secs > 0)
        .map(|secs| Duration::from_secs(u64::from(secs)))
}

fn allowed_prefixes(allowed: &[AllowedIp]) -> Vec<IpNet> {
    allowed
        .iter()
        .filter_map(|ip| match IpNet::new(ip.address, ip.cidr) {
            Ok(net) => Some(net),
            Err(err) => {
                warn!(
                    address = %ip.address,
                    cidr = ip.cidr,
                    error = %err,
                    "skipping invalid allowed ip"
                );
                None
            }
        })
        .collect()
}
