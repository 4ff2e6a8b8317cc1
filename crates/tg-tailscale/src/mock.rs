//! Mock Tailscale client for testing.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::IpNet;
use tokio::sync::RwLock;

use crate::client::TailscaleClient;
use crate::error::{TailscaleError, TailscaleResult};
use crate::types::{
    ExitNodeStatus, LoginProfile, NetworkProfile, PeerStatus, Prefs, TailnetStatus,
    TailscaleStatus, UserProfile, WhoIsNode, WhoIsResponse,
};

/// Mock Tailscale client for testing.
///
/// This implementation stores the tailnet in memory and allows tests to
/// configure status, preferences, profiles and whois answers without a real
/// Tailscale connection. Preferences and the login profile start unset, so
/// their fetches fail until a test provides them.
#[derive(Debug, Clone, Default)]
pub struct MockTailscaleClient {
    inner: Arc<RwLock<MockState>>,
}

#[derive(Debug, Default)]
struct MockState {
    status: TailscaleStatus,
    prefs: Option<Prefs>,
    profile: Option<LoginProfile>,
    whois: HashMap<IpAddr, WhoIsResponse>,
    connected: bool,
    latency: Option<Duration>,
}

impl MockTailscaleClient {
    /// Create a new mock client with a running backend and a default self node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockState {
                status: TailscaleStatus {
                    version: "1.80.2-tmock".to_string(),
                    backend_state: "Running".to_string(),
                    self_node: Some(Self::mock_self_node(
                        "mock-self",
                        "mock-host",
                        &[IpAddr::from([100, 64, 0, 1])],
                    )),
                    current_tailnet: Some(TailnetStatus {
                        name: "mock-tailnet".to_string(),
                        magic_dns_suffix: "tailnet.ts.net".to_string(),
                        magic_dns_enabled: true,
                    }),
                    ..Default::default()
                },
                connected: true,
                ..Default::default()
            })),
        }
    }

    /// Create a disconnected mock client. Every call fails with
    /// [`TailscaleError::NotConnected`].
    #[must_use]
    pub fn disconnected() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MockState {
                status: TailscaleStatus {
                    backend_state: "Stopped".to_string(),
                    ..Default::default()
                },
                connected: false,
                ..Default::default()
            })),
        }
    }

    /// Replace the whole status snapshot.
    pub async fn set_status(&self, status: TailscaleStatus) {
        self.inner.write().await.status = status;
    }

    /// Set this node's information.
    pub async fn set_self_node(&self, node: PeerStatus) {
        self.inner.write().await.status.self_node = Some(node);
    }

    /// Remove this node's information, as before the first login.
    pub async fn clear_self_node(&self) {
        self.inner.write().await.status.self_node = None;
    }

    /// Add a peer to the mock tailnet.
    pub async fn add_peer(&self, peer: PeerStatus) {
        self.inner
            .write()
            .await
            .status
            .peer
            .insert(peer.public_key.clone(), peer);
    }

    /// Remove a peer from the mock tailnet.
    pub async fn remove_peer(&self, node_id: &str) {
        self.inner
            .write()
            .await
            .status
            .peer
            .retain(|_, peer| peer.id != node_id);
    }

    /// Set a peer's online status.
    pub async fn set_peer_online(&self, node_id: &str, online: bool) {
        let mut inner = self.inner.write().await;
        if let Some(peer) = inner.status.peer.values_mut().find(|p| p.id == node_id) {
            peer.online = online;
        }
    }

    /// Set the backend state.
    pub async fn set_backend_state(&self, state: impl Into<String>) {
        self.inner.write().await.status.backend_state = state.into();
    }

    /// Set or clear the cached tailnet metadata.
    pub async fn set_current_tailnet(&self, tailnet: Option<TailnetStatus>) {
        self.inner.write().await.status.current_tailnet = tailnet;
    }

    /// Set or clear the exit node this node routes through.
    pub async fn set_exit_node_status(&self, exit_node: Option<ExitNodeStatus>) {
        self.inner.write().await.status.exit_node_status = exit_node;
    }

    /// Register a user profile.
    pub async fn add_user(&self, user: UserProfile) {
        self.inner.write().await.status.user.insert(user.id, user);
    }

    /// Set or clear preferences. Unset preferences make `prefs` fail.
    pub async fn set_prefs(&self, prefs: Option<Prefs>) {
        self.inner.write().await.prefs = prefs;
    }

    /// Set or clear the login profile. Unset makes `profile_status` fail.
    pub async fn set_profile(&self, profile: Option<LoginProfile>) {
        self.inner.write().await.profile = profile;
    }

    /// Answer whois lookups for `ip` (any port) with `response`.
    pub async fn set_whois(&self, ip: IpAddr, response: WhoIsResponse) {
        self.inner.write().await.whois.insert(ip, response);
    }

    /// Delay every call by `latency`.
    pub async fn set_latency(&self, latency: Option<Duration>) {
        self.inner.write().await.latency = latency;
    }

    /// Create a mock peer with common defaults.
    #[must_use]
    pub fn mock_peer(id: &str, hostname: &str, ip: IpAddr, tags: &[&str]) -> PeerStatus {
        PeerStatus {
            id: id.to_string(),
            public_key: format!("nodekey:{id}"),
            host_name: hostname.to_string(),
            dns_name: format!("{hostname}.tailnet.ts.net."),
            os: "linux".to_string(),
            tailscale_ips: vec![ip],
            allowed_ips: Some(vec![IpNet::from(ip)]),
            tags: if tags.is_empty() {
                None
            } else {
                Some(tags.iter().map(|s| (*s).to_string()).collect())
            },
            online: true,
            ..Default::default()
        }
    }

    /// Create a mock self node.
    #[must_use]
    pub fn mock_self_node(id: &str, hostname: &str, ips: &[IpAddr]) -> PeerStatus {
        PeerStatus {
            id: id.to_string(),
            public_key: format!("nodekey:{id}"),
            host_name: hostname.to_string(),
            dns_name: format!("{hostname}.tailnet.ts.net."),
            os: "linux".to_string(),
            tailscale_ips: ips.to_vec(),
            allowed_ips: Some(ips.iter().copied().map(IpNet::from).collect()),
            online: true,
            ..Default::default()
        }
    }

    /// Create a mock login profile.
    #[must_use]
    pub fn mock_profile(
        magic_dns_name: &str,
        domain_name: &str,
        display_name: &str,
    ) -> LoginProfile {
        LoginProfile {
            id: "mock-profile".to_string(),
            name: "mock@example.com".to_string(),
            network_profile: NetworkProfile {
                magic_dns_name: magic_dns_name.to_string(),
                domain_name: domain_name.to_string(),
                display_name: display_name.to_string(),
            },
            ..Default::default()
        }
    }

    /// Create a whois answer carrying masquerade addresses for this node.
    #[must_use]
    pub fn mock_whois(
        v4_masq: Option<std::net::Ipv4Addr>,
        v6_masq: Option<std::net::Ipv6Addr>,
    ) -> WhoIsResponse {
        WhoIsResponse {
            node: WhoIsNode {
                self_node_v4_masq_addr_for_this_peer: v4_masq,
                self_node_v6_masq_addr_for_this_peer: v6_masq,
                ..Default::default()
            },
            user_profile: None,
        }
    }

    async fn ready(&self) -> TailscaleResult<()> {
        let (connected, latency) = {
            let inner = self.inner.read().await;
            (inner.connected, inner.latency)
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if connected {
            Ok(())
        } else {
            Err(TailscaleError::NotConnected)
        }
    }
}

#[async_trait]
impl TailscaleClient for MockTailscaleClient {
    async fn status(&self) -> TailscaleResult<TailscaleStatus> {
        self.ready().await?;
        Ok(self.inner.read().await.status.clone())
    }

    async fn prefs(&self) -> TailscaleResult<Prefs> {
        self.ready().await?;
        self.inner
            .read()
            .await
            .prefs
            .clone()
            .ok_or_else(|| TailscaleError::LocalApiError("500: prefs unavailable".to_string()))
    }

    async fn whois(&self, remote_addr: SocketAddr) -> TailscaleResult<WhoIsResponse> {
        self.ready().await?;
        self.inner
            .read()
            .await
            .whois
            .get(&remote_addr.ip())
            .cloned()
            .ok_or_else(|| TailscaleError::PeerNotFound(remote_addr.to_string()))
    }

    async fn profile_status(&self) -> TailscaleResult<LoginProfile> {
        self.ready().await?;
        self.inner
            .read()
            .await
            .profile
            .clone()
            .ok_or(TailscaleError::NoProfile)
    }
}
