//! `POST /api/detect` — the behavioral detection entry point.

use super::{client_ip, AppState, ErrorBody};
use crate::detection::Verdict;
use crate::telemetry::MovementSample;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct DetectRequest {
    pub session_id: String,
    pub movements: Vec<MovementSample>,
    #[serde(default)]
    pub clicks: u32,
    /// Client clock reading; accepted but the server clock is authoritative.
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
}

/// Pipeline errors go back in the payload, not as transport failures; only
/// malformed bodies are rejected before reaching the orchestrator (by the Json
/// extractor).
pub async fn detect(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(req): Json<DetectRequest>,
) -> Result<Json<Verdict>, Json<ErrorBody>> {
    let ip = client_ip(&headers, connect_info.map(|c| c.0));
    let user_agent = headers
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    debug!(
        session_id = %req.session_id,
        movements = req.movements.len(),
        clicks = req.clicks,
        ip = %ip,
        "detection request"
    );

    state
        .engine
        .detect(&req.session_id, &req.movements, req.clicks, &ip, &user_agent)
        .map(Json)
        .map_err(|e| Json(ErrorBody::new(e.to_string())))
}
