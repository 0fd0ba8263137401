//! Unified controller error
//!
//! Every screen controller reports failures as a [`CoreError`]; turning one
//! into user-facing text is the job of [`crate::notice`].

use app_state::SessionError;
use networking::ApiError;
use storage::{CollectionError, KvError};
use thiserror::Error;

use crate::validation::Rule;

/// Errors produced by screen controllers
#[derive(Debug, Error)]
pub enum CoreError {
    /// A field is missing or malformed
    #[error("Field {field} failed validation: {rule:?}")]
    Validation {
        /// Field name as used in the form
        field: String,
        /// The rule that failed
        rule: Rule,
    },

    /// A pending submission already carries the same unique value
    #[error("A pending submission already uses this {field}")]
    DuplicateSubmission {
        /// The uniqueness field
        field: String,
    },

    /// The event is already in the registered set
    #[error("Already registered for this event")]
    AlreadyRegistered,

    /// The event is not in the registered set
    #[error("Not registered for this event")]
    NotRegistered,

    /// No slots left
    #[error("Event is full")]
    EventFull,

    /// Progress update on a module the user has not enrolled in
    #[error("Not enrolled in this module")]
    NotEnrolled,

    /// Unknown id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Only the author may do this
    #[error("Only the author can modify this item")]
    NotAuthor,

    /// The action needs a signed-in user
    #[error("Login required")]
    LoginRequired,

    /// A record changed between read and write
    #[error("Concurrent modification: {0}")]
    Conflict(String),

    /// Local persistence failed
    #[error("Storage error: {0}")]
    Storage(#[source] CollectionError),

    /// The account service rejected the request or could not be reached
    #[error("Remote error: {0}")]
    Remote(#[from] ApiError),
}

/// Result type for controller operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Shorthand for a validation failure
    pub fn validation(field: impl Into<String>, rule: Rule) -> Self {
        CoreError::Validation { field: field.into(), rule }
    }
}

impl From<CollectionError> for CoreError {
    fn from(error: CollectionError) -> Self {
        match error {
            CollectionError::NotFound(id) => CoreError::NotFound(id),
            conflict @ (CollectionError::Conflict { .. } | CollectionError::Duplicate(_)) => {
                CoreError::Conflict(conflict.to_string())
            }
            other => CoreError::Storage(other),
        }
    }
}

impl From<KvError> for CoreError {
    fn from(error: KvError) -> Self {
        CoreError::Storage(CollectionError::Store(error))
    }
}

impl From<SessionError> for CoreError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NotLoggedIn => CoreError::LoginRequired,
            SessionError::Storage(e) => e.into(),
        }
    }
}
