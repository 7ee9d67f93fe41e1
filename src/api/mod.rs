//! REST boundary: detection endpoint plus the operator surface over the
//! session store.

mod admin;
mod detect;

use crate::detection::DetectionEngine;
use crate::model::Classifier;
use crate::store::SessionStore;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared per-process state. The classifier and store are the only mutable
/// things concurrent requests touch, and both serialize internally.
pub struct AppState {
    pub engine: DetectionEngine,
    pub classifier: Arc<dyn Classifier>,
    pub store: Arc<SessionStore>,
    pub recent_limit: usize,
}

/// Error payload shape shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/detect", post(detect::detect))
        .route("/api/session/:id", get(admin::get_session))
        .route("/api/admin/sessions", get(admin::list_sessions))
        .route("/api/admin/block/:id", post(admin::block_session))
        .route("/api/admin/delete/:id", delete(admin::delete_session))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Resolve the client address: X-Forwarded-For first hop, then X-Real-IP,
/// then the socket peer.
pub(crate) fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(real) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        if !real.is_empty() {
            return real.to_string();
        }
    }
    peer.map(|p| p.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    model_loaded: bool,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        model_loaded: state.classifier.is_loaded(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers, None), "203.0.113.9");
    }

    #[test]
    fn real_ip_is_second_choice() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.7"));
        assert_eq!(client_ip(&headers, None), "198.51.100.7");
    }

    #[test]
    fn falls_back_to_peer_then_unknown() {
        let headers = HeaderMap::new();
        let peer: SocketAddr = "192.0.2.4:5123".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(peer)), "192.0.2.4");
        assert_eq!(client_ip(&headers, None), "unknown");
    }
}
