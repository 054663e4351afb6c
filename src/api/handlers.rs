//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::CONTENT_TYPE, HeaderMap},
    response::Json,
};
use tracing::info;

use crate::{
    error::AppError,
    services::sound_search::status_message,
    services::AlarmInfo,
    state::{AppState, BlobId, BlobRef, DefaultSound, Preset, PresetId, TimerId, TimerView},
};

use super::responses::{
    ApiResponse, CreateTimerRequest, HealthResponse, MessageRequest, PermissionRequest,
    PreviewRequest, SearchQuery, SearchResponse, SettingsResponse, StatusResponse, UploadQuery,
};

type Shared = State<Arc<AppState>>;
type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

fn content_type(headers: &HeaderMap) -> String {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string()
}

/// Handle POST /timers - Start a new countdown
pub async fn create_timer_handler(
    State(state): Shared,
    Json(req): Json<CreateTimerRequest>,
) -> ApiResult<TimerView> {
    let timer = state.create_timer(&req.label, req.duration_seconds(), req.sound)?;
    Ok(Json(ApiResponse::ok(
        format!("Timer '{}' started", timer.label),
        timer,
    )))
}

/// Handle GET /timers - List live timers
pub async fn list_timers_handler(State(state): Shared) -> ApiResult<Vec<TimerView>> {
    let timers = state.list_timers()?;
    Ok(Json(ApiResponse::ok(format!("{} timers", timers.len()), timers)))
}

/// Handle GET /timers/:id
pub async fn get_timer_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<TimerView> {
    let timer = state.get_timer(id)?;
    Ok(Json(ApiResponse::ok(timer.remaining.clone(), timer)))
}

/// Handle POST /timers/:id/pause
pub async fn pause_timer_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<TimerView> {
    let timer = state.pause_timer(id)?;
    Ok(Json(ApiResponse::ok("Timer paused", timer)))
}

/// Handle POST /timers/:id/resume
pub async fn resume_timer_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<TimerView> {
    let timer = state.resume_timer(id)?;
    Ok(Json(ApiResponse::ok("Timer resumed", timer)))
}

/// Handle POST /timers/:id/toggle - The single Pause/Resume button
pub async fn toggle_timer_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<TimerView> {
    let timer = state.toggle_timer(id)?;
    let message = format!("Timer {:?}", timer.status).to_lowercase();
    Ok(Json(ApiResponse::ok(message, timer)))
}

/// Handle POST /timers/:id/stop
pub async fn stop_timer_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<TimerView> {
    let timer = state.stop_timer(id)?;
    Ok(Json(ApiResponse::ok("Timer stopped", timer)))
}

/// Handle POST /timers/:id/save - Save the timer as a preset
pub async fn save_preset_handler(
    State(state): Shared,
    Path(id): Path<TimerId>,
) -> ApiResult<Preset> {
    let preset = state.save_preset(id)?;
    Ok(Json(ApiResponse::ok("Saved timer", preset)))
}

/// Handle GET /presets
pub async fn list_presets_handler(State(state): Shared) -> ApiResult<Vec<Preset>> {
    let presets = state.list_presets()?;
    let message = if presets.is_empty() {
        "No saved timers yet.".to_string()
    } else {
        format!("{} saved timers", presets.len())
    };
    Ok(Json(ApiResponse::ok(message, presets)))
}

/// Handle POST /presets/:id/start - Load a preset into a new timer
pub async fn start_preset_handler(
    State(state): Shared,
    Path(id): Path<PresetId>,
) -> ApiResult<TimerView> {
    let timer = state.start_preset(id)?;
    Ok(Json(ApiResponse::ok("Loaded saved timer", timer)))
}

/// Handle DELETE /presets/:id
pub async fn delete_preset_handler(
    State(state): Shared,
    Path(id): Path<PresetId>,
) -> ApiResult<PresetId> {
    state.delete_preset(id)?;
    Ok(Json(ApiResponse::ok("Removed saved timer", id)))
}

/// Handle DELETE /presets - Remove every preset
pub async fn clear_presets_handler(State(state): Shared) -> ApiResult<usize> {
    let removed = state.clear_presets()?;
    Ok(Json(ApiResponse::ok("All saved timers cleared", removed)))
}

/// Handle POST /sounds?name=.. - Upload a sound for use by timers
pub async fn upload_sound_handler(
    State(state): Shared,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<BlobRef> {
    let blob = state.upload_sound(&query.name, &content_type(&headers), body.to_vec())?;
    Ok(Json(ApiResponse::ok("Successfully added sound", blob)))
}

/// Handle DELETE /sounds/:id - Forget an uploaded sound
pub async fn remove_sound_handler(
    State(state): Shared,
    Path(id): Path<BlobId>,
) -> ApiResult<BlobId> {
    state.remove_sound(id)?;
    Ok(Json(ApiResponse::ok("Removed sound", id)))
}

/// Handle POST /sounds/preview - Play a search result through the alarm slot
pub async fn preview_sound_handler(
    State(state): Shared,
    Json(req): Json<PreviewRequest>,
) -> ApiResult<AlarmInfo> {
    let preview = state.preview_sound(&req.name, &req.url)?;
    Ok(Json(ApiResponse::ok(
        format!("Previewing {}", preview.sound),
        preview,
    )))
}

/// Handle GET /sounds/search?q=..
pub async fn search_sounds_handler(
    State(state): Shared,
    Query(query): Query<SearchQuery>,
) -> ApiResult<SearchResponse> {
    let results = state.search_sounds(&query.q).await?;
    let status_message = status_message(&results);
    info!("Sound search '{}': {}", query.q, status_message);
    Ok(Json(ApiResponse::ok(
        status_message.clone(),
        SearchResponse {
            status_message,
            results,
        },
    )))
}

/// Handle DELETE /alarm - Silence the current alarm
pub async fn silence_alarm_handler(State(state): Shared) -> ApiResult<bool> {
    let silenced = state.silence_alarm()?;
    let message = if silenced { "Alarm silenced" } else { "No alarm playing" };
    Ok(Json(ApiResponse::ok(message, silenced)))
}

/// Handle GET /settings
pub async fn settings_handler(State(state): Shared) -> ApiResult<SettingsResponse> {
    let settings = SettingsResponse {
        default_sound: state.default_sound()?.map(|s| s.name),
        notification_message: state.notification_message()?,
        notifications_granted: state.notifier.permission_granted(),
        sound_search_available: state.sound_search.is_available(),
    };
    Ok(Json(ApiResponse::ok("Settings", settings)))
}

/// Handle PUT /settings/notification-message
pub async fn set_notification_message_handler(
    State(state): Shared,
    Json(req): Json<MessageRequest>,
) -> ApiResult<String> {
    state.set_notification_message(&req.message)?;
    let message = state.notification_message()?;
    Ok(Json(ApiResponse::ok("Notification message saved!", message)))
}

/// Handle PUT /settings/default-sound?name=..
pub async fn set_default_sound_handler(
    State(state): Shared,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<String> {
    let saved: DefaultSound = state.set_default_sound(&query.name, &content_type(&headers), &body)?;
    Ok(Json(ApiResponse::ok("Default sound saved!", saved.name)))
}

/// Handle DELETE /settings/default-sound
pub async fn clear_default_sound_handler(State(state): Shared) -> ApiResult<()> {
    state.clear_default_sound()?;
    Ok(Json(ApiResponse::ok("Default sound cleared", ())))
}

/// Handle POST /notifications/permission
pub async fn notification_permission_handler(
    State(state): Shared,
    Json(req): Json<PermissionRequest>,
) -> ApiResult<bool> {
    state.set_notification_permission(req.granted);
    let message = if req.granted {
        "Notifications enabled"
    } else {
        "Notifications disabled"
    };
    Ok(Json(ApiResponse::ok(message, req.granted)))
}

/// Handle POST /notifications/test
pub async fn test_notification_handler(State(state): Shared) -> ApiResult<()> {
    state.test_notification()?;
    Ok(Json(ApiResponse::ok("Test notification sent!", ())))
}

/// Handle GET /status - Live timers and service information
pub async fn status_handler(State(state): Shared) -> Result<Json<StatusResponse>, AppError> {
    let timers = state.list_timers()?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        running: state.running_timers()?,
        timers,
        active_alarm: state.active_alarm(),
        notifications_granted: state.notifier.permission_granted(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
