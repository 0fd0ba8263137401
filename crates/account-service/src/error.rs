//! Service errors and their HTTP mapping

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use networking::ErrorBody;
use storage::DatabaseError;
use thiserror::Error;

/// Errors returned by the account service handlers
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A field failed validation
    #[error("{0}")]
    Validation(String),

    /// Another user already has this email
    #[error("Email already registered")]
    DuplicateEmail,

    /// Unknown email or wrong password
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// No user with this id
    #[error("User not found")]
    NotFound,

    /// The body is not the JSON the route expects
    #[error("Invalid request body")]
    MalformedBody(#[source] JsonRejection),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// A stored row could not be decoded
    #[error("Corrupt user record: {0}")]
    CorruptRecord(String),

    /// bcrypt failed or its worker thread died
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

impl ServiceError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_)
            | ServiceError::DuplicateEmail
            | ServiceError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ServiceError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Database(_)
            | ServiceError::CorruptRecord(_)
            | ServiceError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => ServiceError::DuplicateEmail,
            _ => ServiceError::Database(DatabaseError::Sqlx(error)),
        }
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::MalformedBody(rejection)
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            if let ServiceError::MalformedBody(rejection) = &self {
                tracing::debug!(reason = %rejection.body_text(), "rejected request body");
            }
            self.to_string()
        };

        (status, Json(ErrorBody { message })).into_response()
    }
}
