//! Domain errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid or already used authorization code")]
    InvalidCode,

    #[error("Authorization code expired")]
    CodeExpired,

    #[error("redirect_uri does not match the authorization request")]
    RedirectMismatch,

    #[error("app_id is required for local logout")]
    MissingAppId,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Too many login attempts")]
    TooManyRequests,

    #[error("Account API unavailable: {0}")]
    CollaboratorUnavailable(String),

    #[error("Account API rejected the request ({status}): {message}")]
    CollaboratorRejected { status: u16, message: String },

    #[error("Server misconfiguration: {0}")]
    Misconfigured(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Stable machine-readable code used in error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::InvalidCredentials => "invalid_credentials",
            DomainError::Unauthenticated => "unauthenticated",
            DomainError::InvalidCode => "invalid_code",
            DomainError::CodeExpired => "code_expired",
            DomainError::RedirectMismatch => "redirect_mismatch",
            DomainError::MissingAppId => "missing_app_id",
            DomainError::ValidationError(_) => "validation_error",
            DomainError::TooManyRequests => "too_many_requests",
            DomainError::CollaboratorUnavailable(_) => "collaborator_unavailable",
            DomainError::CollaboratorRejected { .. } => "collaborator_rejected",
            DomainError::Misconfigured(_) => "misconfigured",
            DomainError::StorageError(_) => "storage_error",
            DomainError::SerializationError(_) => "serialization_error",
            DomainError::InternalError(_) => "internal_error",
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::SerializationError(e.to_string())
    }
}
