//! WebSocket route configuration
//!
//! # Endpoints
//!
//! - `GET /` - Voice endpoint: binary audio in, transcription/response/audio out
//! - `GET /text` - Text endpoint: `text` messages in, status/response out

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::ws::{ws_text_handler, ws_voice_handler};
use crate::state::AppState;
use std::sync::Arc;

/// Create the WebSocket router
pub fn create_ws_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(ws_voice_handler))
        .route("/text", get(ws_text_handler))
        .layer(TraceLayer::new_for_http())
}
