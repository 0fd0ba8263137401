//! Core application logic for Sapa UMKM
//!
//! One controller per screen: events, public services, submission forms,
//! forum, e-learning, programs, profile and account. Controllers keep their
//! state in a [`storage::LocalStore`] and report failures as [`CoreError`].

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod auth;
pub mod catalog;
pub mod elearning;
pub mod error;
pub mod events;
pub mod forum;
pub mod ids;
pub mod notice;
pub mod profile;
pub mod programs;
pub mod services;
pub mod settings;
pub mod submissions;
pub mod validation;

#[cfg(test)]
mod test_utils;

pub use error::{CoreError, Result};
pub use notice::{Notice, NoticeKind};

use app_state::SessionContext;
use i18n::{Language, Translator};
use networking::AccountApi;
use std::sync::Arc;
use storage::LocalStore;

/// Every screen controller wired to one store and one session
pub struct SapaApp {
    store: Arc<dyn LocalStore>,
    session: Arc<SessionContext>,
    translator: Translator,
    /// Account screen
    pub auth: auth::AuthController,
    /// Events screen
    pub events: events::EventsController,
    /// Public services directory
    pub services: services::ServicesController,
    /// Submission forms
    pub submissions: submissions::SubmissionsController,
    /// Forum
    pub forum: forum::ForumController,
    /// E-learning
    pub elearning: elearning::ElearningController,
    /// Kemenkop UKM programs
    pub programs: programs::ProgramsController,
    /// Profile screen
    pub profile: profile::ProfileController,
}

impl SapaApp {
    /// Restore the session and language from `store` and build the controllers
    pub async fn open(store: Arc<dyn LocalStore>, api: Arc<dyn AccountApi>) -> Self {
        let session = Arc::new(SessionContext::restore(Arc::clone(&store)).await);
        let language = settings::load_language(store.as_ref()).await;

        tracing::info!(
            logged_in = session.is_logged_in(),
            language = language.tag(),
            "app opened"
        );

        Self {
            auth: auth::AuthController::new(api, Arc::clone(&store), Arc::clone(&session)),
            events: events::EventsController::new(Arc::clone(&store), Arc::clone(&session)),
            services: services::ServicesController::new(Arc::clone(&store)),
            submissions: submissions::SubmissionsController::new(Arc::clone(&store)),
            forum: forum::ForumController::new(Arc::clone(&store), Arc::clone(&session)),
            elearning: elearning::ElearningController::new(Arc::clone(&store)),
            programs: programs::ProgramsController::new(Arc::clone(&store)),
            profile: profile::ProfileController::new(Arc::clone(&store), Arc::clone(&session)),
            translator: Translator::new(language),
            store,
            session,
        }
    }

    /// The shared session
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Translator for the active language
    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Switch the UI language and remember the choice
    pub async fn set_language(&mut self, language: Language) -> Result<()> {
        settings::save_language(self.store.as_ref(), language).await?;
        self.translator = Translator::new(language);
        Ok(())
    }

    /// Notice for a successful action
    pub fn success(&self, id: &str, args: &[(&str, &str)]) -> Notice {
        Notice::success(&self.translator, id, args)
    }

    /// Notice for a failed action
    pub fn failure(&self, error: &CoreError) -> Notice {
        Notice::from_error(&self.translator, error)
    }
}
