use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::{ApiError, ErrorCode};
use thiserror::Error;
use tracing::error;

use crate::{PersistenceError, StoryError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("server io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to open session store: {0}")]
    Store(#[from] PersistenceError),
}

#[derive(Debug)]
pub(crate) struct HttpApiError {
    pub(crate) status: StatusCode,
    pub(crate) error: ApiError,
}

impl HttpApiError {
    pub(crate) fn session_not_found(session_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::SessionNotFound,
                "Game session not found",
                Some(format!("session_id={session_id}")),
            ),
        }
    }

    pub(crate) fn scenario_not_found(scenario_id: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(
                ErrorCode::ScenarioNotFound,
                "Scenario not found",
                Some(format!("scenario_id={scenario_id}")),
            ),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: ApiError::new(ErrorCode::NotFound, message, None),
        }
    }

    pub(crate) fn internal(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: ApiError::new(ErrorCode::InternalError, message, details),
        }
    }
}

impl From<StoryError> for HttpApiError {
    fn from(value: StoryError) -> Self {
        match value {
            StoryError::SessionNotFound(session_id) => Self::session_not_found(&session_id),
            StoryError::ScenarioNotFound(scenario_id) => Self::scenario_not_found(&scenario_id),
            StoryError::Persistence(err) => {
                error!(error = %err, "session store operation failed");
                Self::internal("session store operation failed", Some(err.to_string()))
            }
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
