//! Account flow against the remote account service
//!
//! Registration, login and account changes go to the service first. On
//! success the returned user is cached in the local `users` list and the
//! session is updated; on failure nothing local changes.

use app_state::{SessionContext, SessionUser};
use networking::{AccountApi, LoginRequest, RegisterRequest, UpdateUserRequest};
use std::sync::Arc;
use storage::{keys, write_json, Collection, LocalStore, Position};

use crate::error::Result;
use crate::validation::{self, Rule};

/// Minimum password length accepted by the service
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Account screen controller
pub struct AuthController {
    api: Arc<dyn AccountApi>,
    store: Arc<dyn LocalStore>,
    session: Arc<SessionContext>,
    users: Collection<SessionUser>,
}

impl AuthController {
    /// Create a controller using `api` for remote calls
    pub fn new(
        api: Arc<dyn AccountApi>,
        store: Arc<dyn LocalStore>,
        session: Arc<SessionContext>,
    ) -> Self {
        Self {
            users: Collection::new(Arc::clone(&store), keys::USERS),
            api,
            store,
            session,
        }
    }

    /// Create an account and sign in as the new user
    ///
    /// Name, email and phone are trimmed; the password is sent as typed.
    pub async fn register(&self, request: RegisterRequest) -> Result<SessionUser> {
        validation::require("password", &request.password)?;
        let request = RegisterRequest {
            name: validation::require("name", &request.name)?.to_string(),
            email: validation::require("email", &request.email)?.to_string(),
            phone: request.phone.trim().to_string(),
            password: request.password,
        };
        validation::check("email", &request.email, Rule::Email)?;
        if !request.phone.is_empty() {
            validation::check("phone", &request.phone, Rule::Phone)?;
        }
        validation::check("password", &request.password, Rule::MinLength(MIN_PASSWORD_LENGTH))?;

        let user = self.api.register(&request).await?;
        tracing::info!(user_id = %user.id, "account registered");

        self.remember(&user).await?;
        self.seed_profile(&user).await?;
        self.session.sign_in(user.clone()).await?;
        Ok(user)
    }

    /// Sign in with email and password
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionUser> {
        validation::require("password", password)?;
        let request = LoginRequest {
            email: validation::require("email", email)?.to_string(),
            password: password.to_string(),
        };

        let user = self.api.login(&request).await?;

        self.remember(&user).await?;
        self.seed_profile(&user).await?;
        self.session.sign_in(user.clone()).await?;
        Ok(user)
    }

    /// Sign out locally
    pub async fn logout(&self) -> Result<()> {
        self.session.sign_out().await?;
        Ok(())
    }

    /// Push profile changes to the service and refresh the cached user
    pub async fn sync_profile(&self, changes: UpdateUserRequest) -> Result<SessionUser> {
        let current = self.session.require_user()?;
        if changes.is_empty() {
            return Ok(current);
        }

        if let Some(name) = &changes.name {
            validation::require("name", name)?;
        }
        if let Some(email) = &changes.email {
            validation::check("email", email.trim(), Rule::Email)?;
        }
        if let Some(phone) = changes.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            validation::check("phone", phone, Rule::Phone)?;
        }
        if let Some(password) = &changes.password {
            validation::require("password", password)?;
            validation::check("password", password, Rule::MinLength(MIN_PASSWORD_LENGTH))?;
        }

        let updated = self.api.update_user(&current.id, &changes).await?;

        self.remember(&updated).await?;
        let cached = updated.clone();
        self.session.update_user(move |user| *user = cached).await?;

        tracing::info!(user_id = %updated.id, "profile synced");
        Ok(updated)
    }

    /// Delete the account remotely, forget it locally and sign out
    pub async fn delete_account(&self) -> Result<()> {
        let current = self.session.require_user()?;

        self.api.delete_user(&current.id).await?;
        tracing::info!(user_id = %current.id, "account deleted");

        if let Err(e) = self.users.remove(&current.id, None).await {
            tracing::warn!(user_id = %current.id, error = %e, "cached user not removed");
        }
        self.session.sign_out().await?;
        Ok(())
    }

    /// Users known to this device
    pub async fn known_users(&self) -> Vec<SessionUser> {
        match self.users.values().await {
            Ok(users) => users,
            Err(e) => {
                tracing::warn!(error = %e, "user cache unreadable");
                Vec::new()
            }
        }
    }

    /// Insert or replace `user` in the local user list
    async fn remember(&self, user: &SessionUser) -> Result<()> {
        match self.users.get(&user.id).await? {
            Some(existing) => {
                self.users.replace(&user.id, existing.version, user.clone()).await?;
            }
            None => {
                self.users.insert(&user.id, user.clone(), Position::Back).await?;
            }
        }
        Ok(())
    }

    async fn seed_profile(&self, user: &SessionUser) -> Result<()> {
        write_json(self.store.as_ref(), keys::PROFILE_NAME, &user.name).await?;
        write_json(self.store.as_ref(), keys::PROFILE_EMAIL, &user.email).await?;
        write_json(self.store.as_ref(), keys::PROFILE_PHONE, &user.phone).await?;
        Ok(())
    }
}
