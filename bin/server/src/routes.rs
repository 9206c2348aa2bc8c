//! HTTP routes.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use coffeebot_conversation::Activity;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Path the channel posts activities to.
pub const MESSAGES_PATH: &str = "/api/messages";

/// Builds the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(MESSAGES_PATH, post(messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Receives one activity from the channel and replies to it.
///
/// Always answers 200 once the activity parses; handling failures are
/// logged rather than surfaced to the channel.
pub async fn messages(
    State(state): State<Arc<AppState>>,
    Json(activity): Json<Activity>,
) -> StatusCode {
    if let Err(report) = state.activity_router.route(&activity).await {
        tracing::error!(
            error = %report,
            channel_id = %activity.channel_id,
            conversation_id = %activity.conversation.id,
            "Failed to handle activity"
        );
    }
    StatusCode::OK
}
