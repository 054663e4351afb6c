//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Uploads may be a little larger than the saved-default limit
const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/timers", post(create_timer_handler).get(list_timers_handler))
        .route("/timers/:id", get(get_timer_handler))
        .route("/timers/:id/pause", post(pause_timer_handler))
        .route("/timers/:id/resume", post(resume_timer_handler))
        .route("/timers/:id/toggle", post(toggle_timer_handler))
        .route("/timers/:id/stop", post(stop_timer_handler))
        .route("/timers/:id/save", post(save_preset_handler))
        .route("/presets", get(list_presets_handler).delete(clear_presets_handler))
        .route("/presets/:id", delete(delete_preset_handler))
        .route("/presets/:id/start", post(start_preset_handler))
        .route("/sounds", post(upload_sound_handler))
        .route("/sounds/:id", delete(remove_sound_handler))
        .route("/sounds/preview", post(preview_sound_handler))
        .route("/sounds/search", get(search_sounds_handler))
        .route("/alarm", delete(silence_alarm_handler))
        .route("/settings", get(settings_handler))
        .route(
            "/settings/notification-message",
            put(set_notification_message_handler),
        )
        .route(
            "/settings/default-sound",
            put(set_default_sound_handler).delete(clear_default_sound_handler),
        )
        .route("/notifications/permission", post(notification_permission_handler))
        .route("/notifications/test", post(test_notification_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
