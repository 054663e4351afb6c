//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    services::{AlarmInfo, SoundHit},
    state::{SoundSpec, TimerView},
    utils::format::total_seconds_from_parts,
};

/// Envelope for successful responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ErrorResponse {
    pub fn new(message: String) -> Self {
        Self {
            status: "error".to_string(),
            message,
            timestamp: Utc::now(),
        }
    }
}

/// POST /timers body. Duration is either `total_seconds` or the
/// hour/minute/second form fields.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTimerRequest {
    pub label: String,
    #[serde(default)]
    pub hours: u64,
    #[serde(default)]
    pub minutes: u64,
    #[serde(default)]
    pub seconds: u64,
    pub total_seconds: Option<u64>,
    #[serde(default)]
    pub sound: SoundSpec,
}

impl CreateTimerRequest {
    pub fn duration_seconds(&self) -> u64 {
        self.total_seconds
            .unwrap_or_else(|| total_seconds_from_parts(self.hours, self.minutes, self.seconds))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadQuery {
    pub name: String,
}

/// POST /sounds/preview body, one search result
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub status_message: String,
    pub results: Vec<SoundHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PermissionRequest {
    pub granted: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub default_sound: Option<String>,
    pub notification_message: String,
    pub notifications_granted: bool,
    pub sound_search_available: bool,
}

/// Service status with the live timers
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub timers: Vec<TimerView>,
    pub running: usize,
    pub active_alarm: Option<AlarmInfo>,
    pub notifications_granted: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
