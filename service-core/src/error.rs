use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Closed set of request outcomes. Every handler returns one of these and
/// `IntoResponse` is the only place they become HTTP status codes.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(anyhow::Error),

    #[error("{0}")]
    NotFound(anyhow::Error),

    #[error("{0}")]
    Misconfigured(anyhow::Error),

    #[error("{0}")]
    Upstream(anyhow::Error),

    #[error("{0}")]
    Persistence(anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Misconfigured(_) | AppError::Upstream(_) | AppError::Persistence(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Misconfigured(_) => "misconfigured",
            AppError::Upstream(_) => "upstream",
            AppError::Persistence(_) => "persistence",
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Misconfigured(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::Persistence(anyhow::Error::new(err))
    }
}

impl From<mongodb::bson::ser::Error> for AppError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        AppError::Persistence(anyhow::Error::new(err))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), detail = %detail, "Request failed");
        } else {
            tracing::debug!(kind = self.kind(), detail = %detail, "Request rejected");
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}
