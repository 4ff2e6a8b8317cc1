//! `tgdaemon` - TailGuard status page server.

#![forbid(unsafe_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tg_daemon::config::DEFAULT_MARKER_DIR;
use tg_daemon::{
    AppState, EpochMarkers, ProcessEnv, TailGuardConfig, TelemetryConfig, init_logging, serve,
    server, shutdown_signal,
};
use tg_status::StatusAssembler;
use tg_tailscale::{DEFAULT_LOCALAPI_SOCKET, LocalApiClient, TailscaleClient};
use tg_wireguard::{WgBackend, WgControlClient};
use tracing::info;

/// WireGuard driver interface.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    /// Kernel module (Linux).
    Kernel,
    /// Userspace implementation over its UAPI socket.
    Userspace,
}

impl From<BackendArg> for WgBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Kernel => Self::Kernel,
            BackendArg::Userspace => Self::Userspace,
        }
    }
}

/// TailGuard status page server.
#[derive(Parser, Debug)]
#[command(name = "tgdaemon")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "TG_STATUS_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Address to listen on.
    #[arg(long, env = "TG_STATUS_BIND", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = "TG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Emit JSON logs.
    #[arg(long, env = "TG_JSON_LOGS")]
    json_logs: bool,

    /// Path of the tailscaled LocalAPI socket.
    #[arg(long, env = "TG_LOCALAPI_SOCKET", default_value = DEFAULT_LOCALAPI_SOCKET)]
    localapi_socket: String,

    /// Reach the LocalAPI over TCP at this base URL instead of the socket.
    #[arg(long, env = "TG_LOCALAPI_URL")]
    localapi_url: Option<String>,

    /// WireGuard driver interface.
    #[arg(long, env = "TG_WG_BACKEND", value_enum, default_value_t = BackendArg::Kernel)]
    wg_backend: BackendArg,

    /// Upper bound on the upstream queries of one page load, in milliseconds.
    #[arg(long, env = "TG_REQUEST_TIMEOUT_MS", default_value_t = 5000)]
    request_timeout_ms: u64,

    /// Directory holding the startup and health epoch markers.
    #[arg(long, env = "TG_MARKER_DIR", default_value = DEFAULT_MARKER_DIR)]
    marker_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&TelemetryConfig::new(args.log_level.clone()).with_json_logs(args.json_logs))?;

    let config = TailGuardConfig::from_env(&ProcessEnv).context("invalid TailGuard environment")?;
    info!(
        wireguard_device = %config.wireguard_device,
        tailscale_device = %config.tailscale_device,
        "loaded TailGuard configuration"
    );

    let tailscale: Arc<dyn TailscaleClient> = match &args.localapi_url {
        Some(url) => Arc::new(LocalApiClient::with_http(url.as_str())?),
        None => Arc::new(LocalApiClient::with_socket(&args.localapi_socket)?),
    };
    let wireguard = Arc::new(WgControlClient::new(args.wg_backend.into()));
    let assembler = StatusAssembler::new(tailscale, wireguard, config.wireguard_device.clone());

    let state = AppState::with_limits(
        assembler,
        config,
        EpochMarkers::new(args.marker_dir),
        Duration::from_millis(args.request_timeout_ms),
        server::INDEX_COOLDOWN,
    );

    let listener = server::bind(SocketAddr::new(args.bind, args.port)).await?;
    serve(listener, state, shutdown_signal()).await?;

    info!("tgdaemon stopped");
    Ok(())
}
