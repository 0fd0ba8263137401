//! Government-program form submissions
//!
//! Each form type appends to its own `<formType>Submissions` list. Entries
//! are never updated or deleted on the device; they stay `pending`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use storage::{keys, Collection, LocalStore, Position};

use crate::error::{CoreError, Result};
use crate::ids;
use crate::validation::{self, Rule};

/// Form field values by field name
pub type Fields = BTreeMap<String, String>;

/// Build [`Fields`] from literal pairs
pub fn fields<const N: usize>(pairs: [(&str, &str); N]) -> Fields {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect()
}

/// Kinds of forms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormType {
    /// Business licensing (NIB)
    Perizinan,
    /// Business funding
    Pendanaan,
    /// Training enrollment
    Pelatihan,
    /// Product certification
    Sertifikasi,
    /// Trademark registration
    Merek,
    /// LPDB revolving fund
    Lpdb,
    /// Ultra-micro financing
    Umi,
    /// Business incubation
    Inkubasi,
    /// Periodic business report
    Laporan,
    /// Marketing support
    Pemasaran,
    /// Business profile update
    ProfileUpdate,
}

/// Field requirements of one form
#[derive(Debug, Clone, Copy)]
pub struct FormSpec {
    /// Fields that must be present and non-blank, in form order
    pub required: &'static [&'static str],
    /// Field that must not repeat among pending submissions
    pub unique: Option<&'static str>,
}

impl FormType {
    /// Every form type
    pub const ALL: [FormType; 11] = [
        FormType::Perizinan,
        FormType::Pendanaan,
        FormType::Pelatihan,
        FormType::Sertifikasi,
        FormType::Merek,
        FormType::Lpdb,
        FormType::Umi,
        FormType::Inkubasi,
        FormType::Laporan,
        FormType::Pemasaran,
        FormType::ProfileUpdate,
    ];

    /// camelCase name used in storage keys and the `type` field
    pub fn key(self) -> &'static str {
        match self {
            FormType::Perizinan => "perizinan",
            FormType::Pendanaan => "pendanaan",
            FormType::Pelatihan => "pelatihan",
            FormType::Sertifikasi => "sertifikasi",
            FormType::Merek => "merek",
            FormType::Lpdb => "lpdb",
            FormType::Umi => "umi",
            FormType::Inkubasi => "inkubasi",
            FormType::Laporan => "laporan",
            FormType::Pemasaran => "pemasaran",
            FormType::ProfileUpdate => "profileUpdate",
        }
    }

    /// Storage key of this form's submissions
    pub fn storage_key(self) -> String {
        keys::submissions(self.key())
    }

    /// Catalog id of the form's display name
    pub fn message_id(self) -> String {
        format!("form-{}", self.key())
    }

    /// Field requirements
    pub fn spec(self) -> FormSpec {
        match self {
            FormType::Perizinan => FormSpec {
                required: &[
                    "ownerName",
                    "nik",
                    "businessName",
                    "businessAddress",
                    "businessType",
                    "kbli",
                ],
                unique: Some("nik"),
            },
            FormType::Pendanaan => FormSpec {
                required: &["ownerName", "nik", "businessName", "amount", "purpose"],
                unique: Some("nik"),
            },
            FormType::Pelatihan => FormSpec {
                required: &["name", "email", "phone", "businessName", "trainingTopic"],
                unique: Some("email"),
            },
            FormType::Sertifikasi => FormSpec {
                required: &["businessName", "nib", "productName", "certificationType"],
                unique: Some("productName"),
            },
            FormType::Merek => FormSpec {
                required: &["ownerName", "nik", "brandName", "productClass"],
                unique: Some("brandName"),
            },
            FormType::Lpdb => FormSpec {
                required: &["businessName", "nib", "npwp", "amount", "purpose"],
                unique: Some("npwp"),
            },
            FormType::Umi => FormSpec {
                required: &["ownerName", "nik", "businessName", "amount", "phone"],
                unique: Some("nik"),
            },
            FormType::Inkubasi => FormSpec {
                required: &[
                    "ownerName",
                    "businessName",
                    "email",
                    "phone",
                    "businessStage",
                    "description",
                ],
                unique: Some("email"),
            },
            FormType::Laporan => FormSpec {
                required: &["nib", "period", "revenue", "employees"],
                unique: Some("period"),
            },
            FormType::Pemasaran => FormSpec {
                required: &["businessName", "productName", "channel", "phone"],
                unique: None,
            },
            FormType::ProfileUpdate => FormSpec {
                required: &["businessName", "ownerName"],
                unique: None,
            },
        }
    }
}

/// Review state of a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Waiting for review
    Pending,
    /// Accepted
    Approved,
    /// Declined
    Rejected,
}

/// A stored form entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Submission id (timestamp)
    pub id: String,
    /// Form type
    #[serde(rename = "type")]
    pub form_type: FormType,
    /// Review state
    pub status: SubmissionStatus,
    /// When it was submitted
    pub submitted_at: DateTime<Utc>,
    /// The form fields, stored next to the metadata; never one of
    /// [`validation::RESERVED_FIELDS`]
    #[serde(flatten)]
    pub fields: Fields,
}

/// Validate `input` against `form`, returning trimmed non-blank fields
pub fn validate(form: FormType, input: Fields) -> Result<Fields> {
    let cleaned: Fields = input
        .into_iter()
        .filter_map(|(name, value)| {
            let value = value.trim();
            (!value.is_empty()).then(|| (name, value.to_string()))
        })
        .collect();

    for name in cleaned.keys() {
        validation::check(name, name, Rule::ReservedName)?;
    }
    for field in form.spec().required {
        if !cleaned.contains_key(*field) {
            return Err(CoreError::validation(*field, Rule::Required));
        }
    }
    for (name, value) in &cleaned {
        validation::check_field(name, value)?;
    }

    Ok(cleaned)
}

/// Submissions controller shared by every form screen
#[derive(Clone)]
pub struct SubmissionsController {
    store: Arc<dyn LocalStore>,
}

impl SubmissionsController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>) -> Self {
        Self { store }
    }

    fn collection(&self, form: FormType) -> Collection<Submission> {
        Collection::new(Arc::clone(&self.store), form.storage_key())
    }

    /// Validate and append a submission; nothing is written on failure
    pub async fn submit(&self, form: FormType, input: Fields) -> Result<Submission> {
        let fields = validate(form, input)?;
        let collection = self.collection(form);

        if let Some(unique) = form.spec().unique {
            if let Some(value) = fields.get(unique) {
                let taken = collection.values().await?.iter().any(|existing| {
                    existing.status == SubmissionStatus::Pending
                        && existing
                            .fields
                            .get(unique)
                            .is_some_and(|other| other.eq_ignore_ascii_case(value))
                });
                if taken {
                    return Err(CoreError::DuplicateSubmission { field: unique.to_string() });
                }
            }
        }

        let submission = Submission {
            id: ids::next_id(),
            form_type: form,
            status: SubmissionStatus::Pending,
            submitted_at: Utc::now(),
            fields,
        };
        collection.insert(&submission.id, submission.clone(), Position::Back).await?;

        tracing::info!(form = form.key(), id = %submission.id, "submission stored");
        Ok(submission)
    }

    /// Submissions of `form` in the order they were made
    pub async fn list(&self, form: FormType) -> Vec<Submission> {
        match self.collection(form).values().await {
            Ok(submissions) => submissions,
            Err(e) => {
                tracing::warn!(form = form.key(), error = %e, "submissions unreadable");
                Vec::new()
            }
        }
    }
}
