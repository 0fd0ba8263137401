//! User-facing notices
//!
//! The one place where controller outcomes become text. Controllers return
//! [`CoreError`] values or name a success message; this module looks the
//! words up in the active catalog.

use i18n::Translator;
use networking::ApiError;

use crate::error::CoreError;
use crate::validation::Rule;

/// Kind of notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// The action went through
    Success,
    /// The action was rejected or failed
    Error,
}

/// A message ready to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Success or error
    pub kind: NoticeKind,
    /// Localized text
    pub message: String,
}

impl Notice {
    /// Notice for a successful action, `id` being a `notice-*` catalog entry
    pub fn success(translator: &Translator, id: &str, args: &[(&str, &str)]) -> Self {
        Self { kind: NoticeKind::Success, message: translator.translate_with(id, args) }
    }

    /// Notice for a failed action
    pub fn from_error(translator: &Translator, error: &CoreError) -> Self {
        tracing::debug!(error = %error, "presenting error");
        Self { kind: NoticeKind::Error, message: error_message(translator, error) }
    }

    /// Whether this notice reports a failure
    pub fn is_error(&self) -> bool {
        self.kind == NoticeKind::Error
    }
}

/// Localized label of a form field, or the raw name when the catalog has none
pub fn field_label(translator: &Translator, field: &str) -> String {
    let id = format!("field-{field}");
    if translator.has_message(&id) {
        translator.translate(&id)
    } else {
        field.to_string()
    }
}

fn error_message(translator: &Translator, error: &CoreError) -> String {
    match error {
        CoreError::Validation { field, rule } => {
            let label = field_label(translator, field);
            match rule {
                Rule::MinLength(min) => translator.translate_with(
                    rule.message_id(),
                    &[("field", label.as_str()), ("min", min.to_string().as_str())],
                ),
                _ => translator.translate_with(rule.message_id(), &[("field", label.as_str())]),
            }
        }
        CoreError::DuplicateSubmission { field } => translator.translate_with(
            "error-duplicate-submission",
            &[("field", field_label(translator, field).as_str())],
        ),
        CoreError::AlreadyRegistered => translator.translate("error-already-registered"),
        CoreError::NotRegistered => translator.translate("error-not-registered"),
        CoreError::EventFull => translator.translate("error-event-full"),
        CoreError::NotEnrolled => translator.translate("error-not-enrolled"),
        CoreError::NotFound(_) => translator.translate("error-not-found"),
        CoreError::NotAuthor => translator.translate("error-not-author"),
        CoreError::LoginRequired => translator.translate("error-login-required"),
        CoreError::Conflict(_) => translator.translate("error-conflict"),
        CoreError::Storage(_) => translator.translate("error-storage"),
        CoreError::Remote(api) => remote_message(translator, api),
    }
}

fn remote_message(translator: &Translator, error: &ApiError) -> String {
    match error {
        ApiError::Status { status: 401, .. } => translator.translate("error-invalid-credentials"),
        ApiError::Status { message, .. } if !message.trim().is_empty() => {
            translator.translate_with("error-remote", &[("message", message.as_str())])
        }
        _ => translator.translate("error-network"),
    }
}
