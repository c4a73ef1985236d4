use crate::{
    config::{ConnectionConfig, ServiceMetadata},
    probe::{self, ProbeOutcome},
};
use anyhow::Context;
use axum::{
    Json, Router,
    extract::State,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::{net::IpAddr, sync::Arc, time::Duration};
use tokio::{net::TcpListener, task};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared, read-only state handed to every handler
#[derive(Debug)]
pub struct AppState {
    pub metadata: ServiceMetadata,
    pub db: Option<Arc<ConnectionConfig>>,
    pub probe_timeout: Duration,
}

#[derive(Serialize)]
struct Health {
    ok: bool,
    ts: String,
}

#[derive(Serialize)]
struct Version<'a> {
    app_version: &'a str,
    git_sha: &'a str,
    hostname: &'a str,
    runtime: &'a str,
    ts: String,
}

#[derive(Serialize)]
struct Feature {
    feature_new_ui: bool,
    message: &'static str,
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .route("/version", get(version))
        .route("/feature", get(feature))
        .route("/db", get(db))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the listener and serve until the process exits
///
/// # Errors
///
/// Returns an error if the service fails to bind to the port
pub async fn start(listen: Option<IpAddr>, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let (listener, bind_addr) = match listen {
        Some(addr) => {
            let socket_addr = match addr {
                IpAddr::V4(v4) => format!("{v4}:{port}"),
                IpAddr::V6(v6) => format!("[{v6}]:{port}"),
            };
            let listener = TcpListener::bind(&socket_addr)
                .await
                .with_context(|| format!("Failed to bind {socket_addr}"))?;
            (listener, socket_addr)
        }
        None => {
            // try IPv6 first, fallback to IPv4
            if let Ok(l) = TcpListener::bind(format!("[::]:{port}")).await {
                (l, format!("[::]:{port}"))
            } else {
                let socket_addr = format!("0.0.0.0:{port}");
                let listener = TcpListener::bind(&socket_addr)
                    .await
                    .with_context(|| format!("Failed to bind {socket_addr}"))?;
                (listener, socket_addr)
            }
        }
    };

    info!("Server listening on {bind_addr}");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn banner(State(state): State<Arc<AppState>>) -> String {
    let meta = &state.metadata;
    [
        "Service Probe".to_string(),
        format!("hostname={}", meta.hostname),
        format!("version={}", meta.app_version),
        format!("git_sha={}", meta.git_sha),
        format!("feature_new_ui={}", meta.feature_new_ui),
        String::new(),
        "Endpoints:".to_string(),
        "  /health   -> health check".to_string(),
        "  /version  -> build metadata".to_string(),
        "  /feature  -> feature flag demo".to_string(),
        "  /db       -> DB connectivity check (requires env vars)".to_string(),
    ]
    .join("\n")
}

async fn health() -> impl IntoResponse {
    Json(Health {
        ok: true,
        ts: timestamp(),
    })
}

async fn version(State(state): State<Arc<AppState>>) -> Response {
    let meta = &state.metadata;
    Json(Version {
        app_version: &meta.app_version,
        git_sha: &meta.git_sha,
        hostname: &meta.hostname,
        runtime: &meta.runtime,
        ts: timestamp(),
    })
    .into_response()
}

async fn feature(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(Feature {
        feature_new_ui: state.metadata.feature_new_ui,
        message: state.metadata.feature_message(),
    })
}

/// The probe runs in its own task so a client disconnect cannot cancel it
/// half way; the task always settles and releases its connection.
async fn db(State(state): State<Arc<AppState>>) -> ProbeOutcome {
    let Some(config) = state.db.clone() else {
        return ProbeOutcome::ConfigMissing;
    };

    let limit = state.probe_timeout;
    match task::spawn(async move { probe::probe(&config, limit).await }).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("probe task failed: {e}");
            ProbeOutcome::QueryFailed(format!("probe task failed: {e}"))
        }
    }
}
