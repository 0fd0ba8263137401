//! Personal and business profile

use app_state::SessionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, read_json, write_json, LocalStore};

use crate::error::Result;
use crate::submissions::{FormType, Submission, SubmissionsController};
use crate::validation::{self, Rule};

/// Business profile of the UMKM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UmkmProfile {
    /// Business name (required)
    pub business_name: String,
    /// Owner name (required)
    pub owner_name: String,
    /// Business registration number, 13 digits
    #[serde(default)]
    pub nib: String,
    /// Business classification code, 5 digits
    #[serde(default)]
    pub kbli: String,
    /// Line of business
    #[serde(default)]
    pub business_type: String,
    /// Business address
    #[serde(default)]
    pub address: String,
    /// Number of employees
    #[serde(default)]
    pub employees: Option<u32>,
}

/// Everything the profile screen shows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    /// Display name
    pub name: String,
    /// Email
    pub email: String,
    /// Phone
    pub phone: String,
    /// Business profile, once saved
    pub umkm: Option<UmkmProfile>,
}

/// Profile screen controller
pub struct ProfileController {
    store: Arc<dyn LocalStore>,
    session: Arc<SessionContext>,
    submissions: SubmissionsController,
}

impl ProfileController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>, session: Arc<SessionContext>) -> Self {
        Self { submissions: SubmissionsController::new(Arc::clone(&store)), store, session }
    }

    async fn read_text(&self, key: &str) -> Option<String> {
        match read_json::<String>(self.store.as_ref(), key).await {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "profile field unreadable");
                None
            }
        }
    }

    /// Load the profile; contact fields fall back to the signed-in user
    pub async fn load(&self) -> Profile {
        let (user_name, user_email, user_phone) = self
            .session
            .current()
            .user
            .map(|user| (user.name, user.email, user.phone))
            .unwrap_or_default();

        let umkm = match read_json::<UmkmProfile>(self.store.as_ref(), keys::UMKM_PROFILE).await {
            Ok(umkm) => umkm,
            Err(e) => {
                tracing::warn!(error = %e, "business profile unreadable");
                None
            }
        };

        Profile {
            name: self.read_text(keys::PROFILE_NAME).await.unwrap_or(user_name),
            email: self.read_text(keys::PROFILE_EMAIL).await.unwrap_or(user_email),
            phone: self.read_text(keys::PROFILE_PHONE).await.unwrap_or(user_phone),
            umkm,
        }
    }

    /// Save contact details and mirror them into the session user
    pub async fn update_contact(&self, name: &str, email: &str, phone: &str) -> Result<Profile> {
        let name = validation::require("name", name)?;
        let email = validation::require("email", email)?;
        validation::check("email", email, Rule::Email)?;
        let phone = phone.trim();
        if !phone.is_empty() {
            validation::check("phone", phone, Rule::Phone)?;
        }

        write_json(self.store.as_ref(), keys::PROFILE_NAME, name).await?;
        write_json(self.store.as_ref(), keys::PROFILE_EMAIL, email).await?;
        write_json(self.store.as_ref(), keys::PROFILE_PHONE, phone).await?;

        if self.session.is_logged_in() {
            self.session
                .update_user(|user| {
                    user.name = name.to_string();
                    user.email = email.to_string();
                    user.phone = phone.to_string();
                })
                .await?;
        }

        tracing::info!("contact details saved");
        Ok(self.load().await)
    }

    /// Save the business profile and record it as a profile-update submission
    pub async fn save_business(&self, profile: UmkmProfile) -> Result<(UmkmProfile, Submission)> {
        let profile = UmkmProfile {
            business_name: validation::require("businessName", &profile.business_name)?.to_string(),
            owner_name: validation::require("ownerName", &profile.owner_name)?.to_string(),
            nib: profile.nib.trim().to_string(),
            kbli: profile.kbli.trim().to_string(),
            business_type: profile.business_type.trim().to_string(),
            address: profile.address.trim().to_string(),
            employees: profile.employees,
        };
        if !profile.nib.is_empty() {
            validation::check("nib", &profile.nib, Rule::Nib)?;
        }
        if !profile.kbli.is_empty() {
            validation::check("kbli", &profile.kbli, Rule::Kbli)?;
        }

        write_json(self.store.as_ref(), keys::UMKM_PROFILE, &profile).await?;

        let mut fields = crate::submissions::fields([
            ("businessName", profile.business_name.as_str()),
            ("ownerName", profile.owner_name.as_str()),
            ("nib", profile.nib.as_str()),
            ("kbli", profile.kbli.as_str()),
            ("businessType", profile.business_type.as_str()),
            ("address", profile.address.as_str()),
        ]);
        if let Some(employees) = profile.employees.filter(|n| *n > 0) {
            fields.insert("employees".to_string(), employees.to_string());
        }
        let submission = self.submissions.submit(FormType::ProfileUpdate, fields).await?;

        tracing::info!(business = %profile.business_name, "business profile saved");
        Ok((profile, submission))
    }
}
