//! Mock WireGuard client for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::client::WireGuardClient;
use crate::error::{WireGuardError, WireGuardResult};
use crate::types::{WireGuardDevice, WireGuardPeer};

/// In-memory WireGuard client. Unknown devices fail with
/// [`WireGuardError::DeviceNotFound`].
#[derive(Debug, Clone, Default)]
pub struct MockWireGuardClient {
    inner: Arc<RwLock<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    devices: HashMap<String, WireGuardDevice>,
    latency: Option<Duration>,
}

impl MockWireGuardClient {
    /// Create a client with no devices.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a device.
    pub async fn set_device(&self, device: WireGuardDevice) {
        self.inner
            .write()
            .await
            .devices
            .insert(device.name.clone(), device);
    }

    /// Remove a device, as if the driver were unloaded.
    pub async fn remove_device(&self, name: &str) {
        self.inner.write().await.devices.remove(name);
    }

    /// Delay every query by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.inner.write().await.latency = latency;
    }

    /// Create a device with common defaults.
    #[must_use]
    pub fn mock_device(name: &str, peers: Vec<WireGuardPeer>) -> WireGuardDevice {
        WireGuardDevice {
            name: name.to_string(),
            public_key: Some("c2VydmVyLXB1YmxpYy1rZXktMDAwMDAwMDAwMDA9".to_string()),
            listen_port: Some(51820),
            firewall_mark: None,
            peers,
        }
    }

    /// Create a peer with the given counters and handshake time.
    #[must_use]
    pub fn mock_peer(
        public_key: &str,
        last_handshake_time: Option<SystemTime>,
        receive_bytes: u64,
        transmit_bytes: u64,
    ) -> WireGuardPeer {
        WireGuardPeer {
            public_key: public_key.to_string(),
            endpoint: None,
            persistent_keepalive_interval: None,
            last_handshake_time,
            receive_bytes,
            transmit_bytes,
            allowed_ips: Vec::new(),
        }
    }
}

#[async_trait]
impl WireGuardClient for MockWireGuardClient {
    async fn device(&self, name: &str) -> WireGuardResult<WireGuardDevice> {
        let latency = self.inner.read().await.latency;
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.inner
            .read()
            .await
            .devices
            .get(name)
            .cloned()
            .ok_or_else(|| WireGuardError::DeviceNotFound(name.to_string()))
    }
}
