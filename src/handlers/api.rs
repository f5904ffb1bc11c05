use axum::{Json, extract::State, response::IntoResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Live sessions across both endpoints
    pub sessions: usize,
    /// Upstream services that initialized successfully
    pub upstreams: Vec<String>,
}

/// Health check handler
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK",
        sessions: state.sessions.len(),
        upstreams: state.upstreams(),
    })
}
