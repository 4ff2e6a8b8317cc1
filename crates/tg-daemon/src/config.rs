//! TailGuard container configuration.
//!
//! The container entrypoint exports its settings as environment variables
//! and records startup and health times as Unix epochs in marker files.
//! All variables are required; a missing or unparsable one is fatal.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::error::{DaemonError, DaemonResult};

/// Directory holding the epoch marker files.
pub const DEFAULT_MARKER_DIR: &str = "/tailguard";

const STARTUP_MARKER: &str = ".startup-epoch";
const HEALTHY_MARKER: &str = ".healthy-epoch";

/// Source of environment variables.
pub trait EnvSource {
    /// Value of `name`, if set.
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Settings of the TailGuard container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TailGuardConfig {
    /// Whether the host network is reachable through the tailnet.
    pub expose_host: bool,
    /// Whether the WireGuard side acts as a client.
    pub client_mode: bool,
    /// Nameservers handed to WireGuard peers.
    pub nameservers: String,
    /// WireGuard interface name.
    pub wireguard_device: String,
    /// Whether WireGuard peers are isolated from each other.
    pub wireguard_isolate_peers: bool,
    /// Tailscale interface name.
    pub tailscale_device: String,
    /// Tailscale UDP port.
    pub tailscale_port: u16,
}

impl TailGuardConfig {
    /// Read the configuration from `env`.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::MissingEnv`] for an unset variable and
    /// [`DaemonError::InvalidEnv`] for an unparsable port.
    pub fn from_env(env: &impl EnvSource) -> DaemonResult<Self> {
        Ok(Self {
            expose_host: env_bool(env, "TG_EXPOSE_HOST")?,
            client_mode: env_bool(env, "TG_CLIENT_MODE")?,
            nameservers: env_string(env, "TG_NAMESERVERS")?,
            wireguard_device: env_string(env, "WG_DEVICE")?,
            wireguard_isolate_peers: env_bool(env, "WG_ISOLATE_PEERS")?,
            tailscale_device: env_string(env, "TS_DEVICE")?,
            tailscale_port: env_port(env, "TS_PORT")?,
        })
    }
}

fn env_string(env: &impl EnvSource, name: &'static str) -> DaemonResult<String> {
    env.var(name).ok_or(DaemonError::MissingEnv(name))
}

/// Only `"1"` is true.
fn env_bool(env: &impl EnvSource, name: &'static str) -> DaemonResult<bool> {
    env_string(env, name).map(|value| value == "1")
}

fn env_port(env: &impl EnvSource, name: &'static str) -> DaemonResult<u16> {
    let value = env_string(env, name)?;
    value
        .trim()
        .parse()
        .map_err(|err: std::num::ParseIntError| DaemonError::InvalidEnv {
            name,
            value: value.clone(),
            reason: err.to_string(),
        })
}

/// Startup and health marker files written by the container entrypoint.
#[derive(Debug, Clone)]
pub struct EpochMarkers {
    dir: PathBuf,
}

impl Default for EpochMarkers {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_DIR)
    }
}

impl EpochMarkers {
    /// Markers in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// When the container started.
    #[must_use]
    pub fn startup_time(&self) -> Option<DateTime<Utc>> {
        read_epoch(&self.dir.join(STARTUP_MARKER))
    }

    /// When the container last passed its health check.
    #[must_use]
    pub fn healthy_time(&self) -> Option<DateTime<Utc>> {
        read_epoch(&self.dir.join(HEALTHY_MARKER))
    }
}

/// Read a file holding a Unix epoch in seconds. Missing or malformed files
/// read as `None`.
#[must_use]
pub fn read_epoch(path: &Path) -> Option<DateTime<Utc>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "epoch marker unreadable");
            return None;
        }
    };
    let epoch: i64 = contents.trim().parse().ok()?;
    DateTime::from_timestamp(epoch, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_env() -> HashMap<String, String> {
        [
            ("TG_EXPOSE_HOST", "1"),
            ("TG_CLIENT_MODE", "0"),
            ("TG_NAMESERVERS", "1.1.1.1,9.9.9.9"),
            ("WG_DEVICE", "wg0"),
            ("WG_ISOLATE_PEERS", "1"),
            ("TS_DEVICE", "tailscale0"),
            ("TS_PORT", "41641"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn reads_complete_environment() {
        let config = TailGuardConfig::from_env(&full_env()).unwrap();
        assert_eq!(
            config,
            TailGuardConfig {
                expose_host: true,
                client_mode: false,
                nameservers: "1.1.1.1,9.9.9.9".to_string(),
                wireguard_device: "wg0".to_string(),
                wireguard_isolate_peers: true,
                tailscale_device: "tailscale0".to_string(),
                tailscale_port: 41641,
            }
        );
    }

    #[test]
    fn only_one_is_true() {
        let mut env = full_env();
        env.insert("TG_EXPOSE_HOST".to_string(), "true".to_string());
        assert!(!TailGuardConfig::from_env(&env).unwrap().expose_host);
    }

    #[test]
    fn missing_variable_is_named() {
        let mut env = full_env();
        env.remove("WG_DEVICE");
        let err = TailGuardConfig::from_env(&env).unwrap_err();
        assert!(matches!(err, DaemonError::MissingEnv("WG_DEVICE")));
        assert_eq!(err.to_string(), "environment variable not set: WG_DEVICE");
    }

    #[test]
    fn unparsable_port_is_rejected() {
        let mut env = full_env();
        env.insert("TS_PORT".to_string(), "not-a-port".to_string());
        let err = TailGuardConfig::from_env(&env).unwrap_err();
        assert!(matches!(err, DaemonError::InvalidEnv { name: "TS_PORT", .. }));
    }

    #[test]
    fn epoch_marker_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(STARTUP_MARKER), "1717243200").unwrap();
        std::fs::write(dir.path().join(HEALTHY_MARKER), "1717243260\n").unwrap();

        let markers = EpochMarkers::new(dir.path());
        assert_eq!(markers.startup_time().map(|t| t.timestamp()), Some(1_717_243_200));
        assert_eq!(markers.healthy_time().map(|t| t.timestamp()), Some(1_717_243_260));
    }

    #[test]
    fn missing_or_malformed_marker_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(HEALTHY_MARKER), "yesterday").unwrap();

        let markers = EpochMarkers::new(dir.path());
        assert_eq!(markers.startup_time(), None);
        assert_eq!(markers.healthy_time(), None);
    }
}
