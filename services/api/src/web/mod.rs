pub mod protocol;
pub mod realtime_task;
pub mod rest;
pub mod session;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use state::AppState;
use std::sync::Arc;

// Re-export the handlers most callers want without digging through
// submodules.
pub use rest::{create_interview_handler, score_handler, send_message_handler, ApiDoc};

/// Builds the REST router over a fully wired [`AppState`]. The composition
/// root layers CORS and the Swagger UI on top of this.
pub fn api_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/interviews", post(rest::create_interview_handler))
        .route("/interviews/{id}", get(rest::get_interview_handler))
        .route(
            "/interviews/{id}/messages",
            post(rest::send_message_handler).get(rest::get_messages_handler),
        )
        .route("/interviews/{id}/updates", get(rest::get_updates_handler))
        .route("/interviews/{id}/typing", post(rest::typing_handler))
        .route("/interviews/{id}/audio", post(rest::audio_handler))
        .route("/interviews/{id}/end", post(rest::end_interview_handler))
        .route("/interviews/{id}/score", get(rest::score_handler))
        .route("/interviews/{id}/analytics", get(rest::analytics_handler))
        .route("/health", get(rest::health_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
