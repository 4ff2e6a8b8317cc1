//! Tailscale `LocalAPI` client abstraction.
//!
//! This module provides a trait-based abstraction for the Tailscale `LocalAPI`,
//! allowing for easy testing with mock implementations.
//!
//! # `LocalAPI` Endpoints
//!
//! - `/localapi/v0/status` - Get current tailnet status
//! - `/localapi/v0/prefs` - Get this node's preferences
//! - `/localapi/v0/whois?addr=<ip:port>` - Look up the node owning an address
//! - `/localapi/v0/profiles/current` - Get the active login profile

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::error::{TailscaleError, TailscaleResult};
use crate::types::{LoginProfile, Prefs, TailscaleStatus, WhoIsResponse};

/// Per-request timeout applied by [`LocalApiClient`].
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Trait for Tailscale `LocalAPI` clients.
///
/// All methods are read-only. Callers bound them with their own deadlines;
/// dropping a returned future cancels the request.
#[async_trait]
pub trait TailscaleClient: Send + Sync {
    /// Get the current tailnet status.
    async fn status(&self) -> TailscaleResult<TailscaleStatus>;

    /// Get this node's preferences.
    async fn prefs(&self) -> TailscaleResult<Prefs>;

    /// Look up the node that owns `remote_addr`.
    async fn whois(&self, remote_addr: SocketAddr) -> TailscaleResult<WhoIsResponse>;

    /// Get the active login profile.
    async fn profile_status(&self) -> TailscaleResult<LoginProfile>;

    /// Check if connected to the tailnet.
    async fn is_connected(&self) -> TailscaleResult<bool> {
        let status = self.status().await?;
        Ok(status.backend_state == "Running")
    }
}

/// Real `LocalAPI` client using Unix socket or HTTP.
#[derive(Debug, Clone)]
pub struct LocalApiClient {
    /// HTTP client for making requests.
    client: reqwest::Client,

    /// Base URL for the `LocalAPI`.
    base_url: String,
}

impl LocalApiClient {
    /// Create a new `LocalAPI` client using the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new() -> TailscaleResult<Self> {
        Self::with_socket(crate::DEFAULT_LOCALAPI_SOCKET)
    }

    /// Create a new `LocalAPI` client using a custom socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created, or on platforms
    /// without Unix domain sockets.
    #[cfg(unix)]
    pub fn with_socket(socket_path: &str) -> TailscaleResult<Self> {
        let client = reqwest::Client::builder()
            .unix_socket(std::path::PathBuf::from(socket_path))
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TailscaleError::LocalApiRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: format!("http://{}", crate::LOCALAPI_HOST),
        })
    }

    /// Create a new `LocalAPI` client using a custom socket path.
    ///
    /// # Errors
    ///
    /// Always fails: this platform has no Unix domain sockets.
    #[cfg(not(unix))]
    pub fn with_socket(socket_path: &str) -> TailscaleResult<Self> {
        Err(TailscaleError::LocalApiRequest(format!(
            "cannot reach {socket_path}: unix sockets are unsupported on this platform"
        )))
    }

    /// Create a new `LocalAPI` client using an HTTP URL.
    ///
    /// This is useful for testing or when the `LocalAPI` is exposed over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_http(base_url: impl Into<String>) -> TailscaleResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TailscaleError::LocalApiRequest(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> TailscaleResult<T> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self.client.get(&url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TailscaleError::LocalApiRequest(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            debug!(%status, path, "`LocalAPI` returned an error");
            return Err(TailscaleError::LocalApiError(format!(
                "{status}: {}",
                body.trim()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| TailscaleError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl TailscaleClient for LocalApiClient {
    #[instrument(skip(self))]
    async fn status(&self) -> TailscaleResult<TailscaleStatus> {
        self.get("/localapi/v0/status", &[]).await
    }

    #[instrument(skip(self))]
    async fn prefs(&self) -> TailscaleResult<Prefs> {
        self.get("/localapi/v0/prefs", &[]).await
    }

    #[instrument(skip(self))]
    async fn whois(&self, remote_addr: SocketAddr) -> TailscaleResult<WhoIsResponse> {
        self.get("/localapi/v0/whois", &[("addr", remote_addr.to_string())])
            .await
    }

    #[instrument(skip(self))]
    async fn profile_status(&self) -> TailscaleResult<LoginProfile> {
        self.get("/localapi/v0/profiles/current", &[]).await
    }
}
