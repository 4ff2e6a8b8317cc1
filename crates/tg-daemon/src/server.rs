//! HTTP server for the status page.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::{ConnectInfo, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use tg_status::StatusAssembler;
use tokio::net::TcpListener;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{EpochMarkers, TailGuardConfig};
use crate::error::{DaemonError, DaemonResult};
use crate::ratelimit::Cooldown;
use crate::render::{FAVICON, StatusPage};

/// Minimum time between two status page renders.
pub const INDEX_COOLDOWN: Duration = Duration::from_secs(1);

/// Upper bound on the upstream queries of one page load.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Body of a rate-limited response.
pub const RATE_LIMITED: &str = "Rate limit exceeded. Try again later.";

/// Shared state of the HTTP handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    assembler: StatusAssembler,
    config: TailGuardConfig,
    markers: EpochMarkers,
    cooldown: Cooldown,
    request_timeout: Duration,
}

impl AppState {
    /// Create handler state with the default timeout and cooldown.
    #[must_use]
    pub fn new(assembler: StatusAssembler, config: TailGuardConfig, markers: EpochMarkers) -> Self {
        Self::with_limits(
            assembler,
            config,
            markers,
            DEFAULT_REQUEST_TIMEOUT,
            INDEX_COOLDOWN,
        )
    }

    /// Create handler state with an explicit request timeout and cooldown.
    #[must_use]
    pub fn with_limits(
        assembler: StatusAssembler,
        config: TailGuardConfig,
        markers: EpochMarkers,
        request_timeout: Duration,
        cooldown: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                assembler,
                config,
                markers,
                cooldown: Cooldown::new(cooldown),
                request_timeout,
            }),
        }
    }
}

/// Build the router.
///
/// The index handler reads the caller address from [`ConnectInfo`], so the
/// router must be served with
/// [`into_make_service_with_connect_info`](Router::into_make_service_with_connect_info).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/favicon.svg", get(favicon))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(
    State(state): State<AppState>,
    ConnectInfo(caller): ConnectInfo<SocketAddr>,
) -> Response {
    let inner = &state.inner;
    if !inner.cooldown.try_acquire() {
        warn!(caller = %caller, retry_in = ?inner.cooldown.wait_time(), "status page rate limited");
        return (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED).into_response();
    }

    let deadline = Instant::now() + inner.request_timeout;
    let report = inner.assembler.compute_status(deadline, caller).await;

    let page = StatusPage {
        config: &inner.config,
        startup_time: inner.markers.startup_time(),
        healthy_time: inner.markers.healthy_time(),
        report: &report,
    };
    Html(page.to_string()).into_response()
}

async fn favicon() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], FAVICON)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    warn!(path = %uri.path(), "404 Not Found");
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// Bind the listener for `addr`.
///
/// # Errors
///
/// Returns [`DaemonError::Bind`] if the address is unavailable.
pub async fn bind(addr: SocketAddr) -> DaemonResult<TcpListener> {
    TcpListener::bind(addr)
        .await
        .map_err(|source| DaemonError::Bind { addr, source })
}

/// Serve the status page until `shutdown` completes.
///
/// # Errors
///
/// Returns [`DaemonError::Serve`] if the server fails.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> DaemonResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "status page listening");
    }
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
    .map_err(DaemonError::Serve)
}

/// Resolve on Ctrl+C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
