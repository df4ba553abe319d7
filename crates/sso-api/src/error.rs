use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use sso_core::DomainError;

const GENERIC_SERVER_MESSAGE: &str = "The server could not complete the request";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e {
                DomainError::InvalidCredentials | DomainError::Unauthenticated => {
                    StatusCode::UNAUTHORIZED
                }
                DomainError::InvalidCode
                | DomainError::CodeExpired
                | DomainError::RedirectMismatch
                | DomainError::MissingAppId
                | DomainError::ValidationError(_) => StatusCode::BAD_REQUEST,
                DomainError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
                DomainError::CollaboratorRejected { status, .. } => StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                DomainError::CollaboratorUnavailable(_)
                | DomainError::Misconfigured(_)
                | DomainError::StorageError(_)
                | DomainError::SerializationError(_)
                | DomainError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error, message, details) = match self {
            ApiError::Validation(errors) => {
                tracing::warn!("Validation failed: {}", errors);
                (
                    "validation_error",
                    "Request validation failed".to_string(),
                    serde_json::to_value(&errors).ok(),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                ("validation_error", msg, None)
            }
            ApiError::Domain(e) if status.is_server_error() => {
                tracing::error!(code = e.code(), "Request failed: {}", e);
                (e.code(), GENERIC_SERVER_MESSAGE.to_string(), None)
            }
            ApiError::Domain(DomainError::CollaboratorRejected { status, message }) => {
                tracing::warn!("Account API rejected request ({}): {}", status, message);
                ("collaborator_rejected", message, None)
            }
            ApiError::Domain(e) => {
                tracing::warn!(code = e.code(), "{}", e);
                (e.code(), e.to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}
