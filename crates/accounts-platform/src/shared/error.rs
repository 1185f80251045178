//! Platform Error Types

use thiserror::Error;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response, Json},
};

use crate::shared::api_common::ApiError;
use crate::usecase::UseCaseError;

#[derive(Error, Debug)]
pub enum PlatformError {
    /// Request rejected by the transport before reaching a use case.
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Use case failure, already collapsed to the status the endpoint reports.
    #[error("{message}")]
    Rejected {
        status: StatusCode,
        code: String,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bson::de::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PlatformError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Report a use case failure with `status`, keeping its code and details.
    pub fn rejected(status: StatusCode, err: UseCaseError) -> Self {
        let details = err
            .details()
            .and_then(|d| serde_json::to_value(d).ok());
        Self::Rejected {
            status,
            code: err.code().to_string(),
            message: err.message().to_string(),
            details,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;

impl IntoResponse for PlatformError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            PlatformError::Rejected { status, code, message, details } => (
                status,
                ApiError { error: code, message, details },
            ),
            PlatformError::Validation { message } => (
                StatusCode::BAD_REQUEST,
                ApiError::new("VALIDATION_ERROR", message),
            ),
            other => {
                tracing::error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", other.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Status by category, for callers that do not collapse.
impl From<UseCaseError> for PlatformError {
    fn from(err: UseCaseError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        PlatformError::rejected(status, err)
    }
}
