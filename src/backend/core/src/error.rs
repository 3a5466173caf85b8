//! Error types shared across the scheduler.
//!
//! Mirrors the teacher's single-enum-plus-HTTP-mapping shape: one
//! [`SchedulerError`] covering every domain failure mode named by the
//! component design, translated to HTTP status codes at the API boundary.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, SchedulerError>;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    #[error("queue is empty")]
    QueueEmpty,

    #[error("queue is full")]
    QueueFull,

    #[error("item does not match the queue's declared item type: {0}")]
    InvalidItem(String),

    #[error("push not allowed [on_queue={on_queue}, item_changed={item_changed}, priority_changed={priority_changed}]")]
    NotAllowed {
        on_queue: bool,
        item_changed: bool,
        priority_changed: bool,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("upstream service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream service returned an unexpected response: {0}")]
    UpstreamBadResponse(String),

    #[error("message broker unavailable: {0}")]
    BrokerUnavailable(String),

    #[error("persistence error: {0}")]
    PersistenceError(#[from] sqlx::Error),

    #[error("shutdown requested")]
    Shutdown,
}

impl SchedulerError {
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::QueueEmpty => "QUEUE_EMPTY",
            SchedulerError::QueueFull => "QUEUE_FULL",
            SchedulerError::InvalidItem(_) => "INVALID_ITEM",
            SchedulerError::NotAllowed { .. } => "NOT_ALLOWED",
            SchedulerError::NotFound(_) => "NOT_FOUND",
            SchedulerError::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            SchedulerError::UpstreamBadResponse(_) => "UPSTREAM_BAD_RESPONSE",
            SchedulerError::BrokerUnavailable(_) => "BROKER_UNAVAILABLE",
            SchedulerError::PersistenceError(_) => "PERSISTENCE_ERROR",
            SchedulerError::Shutdown => "SHUTDOWN",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            SchedulerError::QueueEmpty
            | SchedulerError::QueueFull
            | SchedulerError::InvalidItem(_)
            | SchedulerError::NotAllowed { .. } => StatusCode::BAD_REQUEST,
            SchedulerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures a populate loop should log-and-skip rather than abort its tick on.
    pub fn is_candidate_local(&self) -> bool {
        matches!(
            self,
            SchedulerError::UpstreamUnavailable(_) | SchedulerError::UpstreamBadResponse(_)
        )
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: String,
}

impl IntoResponse for SchedulerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            error_code: self.code().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
