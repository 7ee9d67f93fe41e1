//! Operator surface: session lookup, recent-session listing with aggregate
//! counters, block and delete actions.

use super::{AppState, ErrorBody};
use crate::store::{SessionRecord, SessionStats, StoreError};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

type ApiError = (StatusCode, Json<ErrorBody>);

fn store_error(e: StoreError) -> ApiError {
    match e {
        StoreError::NotFound => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody::new("Session not found")),
        ),
        StoreError::Sqlite(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody::new(format!("database error: {e}"))),
        ),
    }
}

pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionRecord>, ApiError> {
    state
        .store
        .get(&session_id)
        .map(Json)
        .map_err(store_error)
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SessionListing {
    #[serde(flatten)]
    pub stats: SessionStats,
    pub sessions: Vec<SessionRecord>,
}

pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<SessionListing>, ApiError> {
    let limit = query.limit.unwrap_or(state.recent_limit);
    let sessions = state.store.list_recent(limit).map_err(store_error)?;
    let stats = state.store.stats().map_err(store_error)?;
    Ok(Json(SessionListing { stats, sessions }))
}

#[derive(Debug, Serialize)]
pub struct ActionBody {
    pub message: String,
}

pub async fn block_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ActionBody>, ApiError> {
    state.store.block(&session_id).map_err(store_error)?;
    info!(session_id = %session_id, "session blocked");
    Ok(Json(ActionBody {
        message: format!("Session {session_id} blocked"),
    }))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ActionBody>, ApiError> {
    state.store.delete(&session_id).map_err(store_error)?;
    info!(session_id = %session_id, "session deleted");
    Ok(Json(ActionBody {
        message: format!("Session {session_id} deleted"),
    }))
}
