//! Session context
//!
//! One shared answer to "is someone logged in, and who". The session is
//! persisted under `isLoggedIn` and `currentUser`, cached in memory, and
//! published through a watch channel so every screen observes the same
//! generation instead of re-reading the flag on its own.

use networking::PublicUser;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, read_json, write_json, KvError, LocalStore};
use thiserror::Error;
use tokio::sync::{watch, Mutex};

/// Session-related errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// The operation needs a signed-in user
    #[error("No user is signed in")]
    NotLoggedIn,

    /// Persisting the session failed
    #[error("Session storage error: {0}")]
    Storage(#[from] KvError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// The signed-in user as cached on the device (never carries a password hash)
pub type SessionUser = PublicUser;

/// Point-in-time view of the session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Incremented on every sign-in, sign-out and user update
    pub generation: u64,
    /// The signed-in user, if any
    pub user: Option<SessionUser>,
}

impl SessionSnapshot {
    /// Whether a user is signed in
    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }
}

/// Shared session state backed by a [`LocalStore`]
pub struct SessionContext {
    store: Arc<dyn LocalStore>,
    state: watch::Sender<SessionSnapshot>,
    write_lock: Mutex<()>,
}

impl SessionContext {
    /// Restore the session persisted in `store`
    ///
    /// Unreadable or inconsistent data restores as signed out.
    pub async fn restore(store: Arc<dyn LocalStore>) -> Self {
        let user = match Self::read_persisted(store.as_ref()).await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "session data unreadable, starting signed out");
                None
            }
        };

        let (state, _) = watch::channel(SessionSnapshot { generation: 0, user });
        Self { store, state, write_lock: Mutex::new(()) }
    }

    async fn read_persisted(store: &dyn LocalStore) -> Result<Option<SessionUser>> {
        let logged_in: bool = read_json(store, keys::IS_LOGGED_IN).await?.unwrap_or(false);
        if !logged_in {
            return Ok(None);
        }

        let user: Option<SessionUser> = read_json(store, keys::CURRENT_USER).await?;
        if user.is_none() {
            tracing::warn!("isLoggedIn set without a current user, treating as signed out");
        }
        Ok(user)
    }

    /// The current snapshot
    pub fn current(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    /// Whether a user is signed in
    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    /// The signed-in user, or [`SessionError::NotLoggedIn`]
    pub fn require_user(&self) -> Result<SessionUser> {
        self.state.borrow().user.clone().ok_or(SessionError::NotLoggedIn)
    }

    /// Receive every future snapshot
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Persist `user` as signed in and notify subscribers
    pub async fn sign_in(&self, user: SessionUser) -> Result<SessionSnapshot> {
        let _guard = self.write_lock.lock().await;

        write_json(self.store.as_ref(), keys::CURRENT_USER, &user).await?;
        write_json(self.store.as_ref(), keys::IS_LOGGED_IN, &true).await?;

        tracing::info!(user_id = %user.id, "signed in");
        Ok(self.publish(Some(user)))
    }

    /// Clear the session and notify subscribers
    pub async fn sign_out(&self) -> Result<SessionSnapshot> {
        let _guard = self.write_lock.lock().await;

        write_json(self.store.as_ref(), keys::IS_LOGGED_IN, &false).await?;
        self.store.remove_item(keys::CURRENT_USER).await?;

        tracing::info!("signed out");
        Ok(self.publish(None))
    }

    /// Edit the cached user, persist it and notify subscribers
    pub async fn update_user<F>(&self, edit: F) -> Result<SessionSnapshot>
    where
        F: FnOnce(&mut SessionUser),
    {
        let _guard = self.write_lock.lock().await;

        let mut user = self.require_user()?;
        edit(&mut user);
        write_json(self.store.as_ref(), keys::CURRENT_USER, &user).await?;

        tracing::debug!(user_id = %user.id, "session user updated");
        Ok(self.publish(Some(user)))
    }

    fn publish(&self, user: Option<SessionUser>) -> SessionSnapshot {
        let generation = self.state.borrow().generation + 1;
        let snapshot = SessionSnapshot { generation, user };
        self.state.send_replace(snapshot.clone());
        snapshot
    }
}
