//! Application error type and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::{
    api::responses::ErrorResponse,
    services::{AudioError, SearchError, StoreError},
    state::{BlobId, PresetId, TimerId},
};

/// Errors surfaced by timer, preset and settings operations.
///
/// None of these are fatal: each one degrades a single feature while the
/// countdown engine keeps running.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timer {0} not found")]
    TimerNotFound(TimerId),

    #[error("preset {0} not found")]
    PresetNotFound(PresetId),

    #[error("uploaded sound {0} not found")]
    BlobNotFound(BlobId),

    #[error("persistent storage unavailable")]
    PersistenceUnavailable(#[from] StoreError),

    #[error("notification permission has not been granted")]
    PermissionDenied,

    #[error("notification delivery failed: {0}")]
    NotificationFailed(String),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("{0} lock poisoned")]
    StatePoisoned(&'static str),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::TimerNotFound(_) | AppError::PresetNotFound(_) | AppError::BlobNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::Search(SearchError::Unavailable) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Search(SearchError::Unauthorized) => StatusCode::UNAUTHORIZED,
            AppError::Search(SearchError::EmptyQuery) => StatusCode::BAD_REQUEST,
            AppError::Search(_) => StatusCode::BAD_GATEWAY,
            AppError::PersistenceUnavailable(_)
            | AppError::NotificationFailed(_)
            | AppError::Audio(_)
            | AppError::StatePoisoned(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}
