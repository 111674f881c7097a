//! ==============================================================================
//! web.rs - dashboard and json api
//! ==============================================================================
//!
//! routes:
//!     GET  /              dashboard page (polls /api/devices every 3s)
//!     GET  /history       history table page (loads /api/history once)
//!     GET  /api/devices   current snapshot + scanning flag
//!     GET  /api/history   scan summaries, oldest first
//!     POST /api/scan      ask for a scan now; answers before it runs
//!
//! the GET handlers take the read side of the state lock; POST /api/scan
//! takes the write side just long enough to set the request flag. the
//! controller never holds the lock across a radio scan, so neither waits
//! on one.
//!
//! ==============================================================================

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use crate::controller::ScanHandle;
use crate::domain::{DiscoveredPeer, ScanSummary};

const DASHBOARD_HTML: &str = include_str!("../assets/dashboard.html");
const HISTORY_HTML: &str = include_str!("../assets/history.html");

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DevicesResponse {
    pub scanning: bool,
    pub last_scan_time: String,
    pub devices: Vec<DiscoveredPeer>,
}

#[derive(Serialize)]
pub struct HistoryResponse {
    pub history: Vec<ScanSummary>,
}

/// GET /api/devices?named_only=true
#[derive(Deserialize, Default)]
pub struct DevicesParams {
    #[serde(default)]
    named_only: bool,
}

pub fn router(handle: ScanHandle) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/history", get(history_page_handler))
        .route("/api/devices", get(devices_handler))
        .route("/api/history", get(history_handler))
        .route("/api/scan", post(scan_handler))
        .layer(CorsLayer::permissive())
        .with_state(handle)
}

/// serve on an already-bound listener
pub async fn serve(listener: TcpListener, handle: ScanHandle) -> Result<()> {
    axum::serve(listener, router(handle)).await?;
    Ok(())
}

pub async fn run_server(handle: ScanHandle, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("[WEB] ✓ Dashboard live at http://{}", addr);
    serve(listener, handle).await
}

async fn dashboard_handler() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

async fn history_page_handler() -> Html<&'static str> {
    Html(HISTORY_HTML)
}

async fn devices_handler(
    State(handle): State<ScanHandle>,
    Query(params): Query<DevicesParams>,
) -> Json<DevicesResponse> {
    let state = handle.read().await;
    let devices = state
        .snapshot
        .peers()
        .iter()
        .filter(|p| !params.named_only || p.is_named())
        .cloned()
        .collect();
    Json(DevicesResponse {
        scanning: state.scanning,
        last_scan_time: state.last_scan_label().to_string(),
        devices,
    })
}

async fn history_handler(State(handle): State<ScanHandle>) -> Json<HistoryResponse> {
    let state = handle.read().await;
    Json(HistoryResponse { history: state.history.records().cloned().collect() })
}

async fn scan_handler(State(handle): State<ScanHandle>) -> Json<serde_json::Value> {
    handle.request_scan().await;
    tracing::info!("[WEB] manual scan requested");
    Json(serde_json::json!({"status": "started"}))
}
