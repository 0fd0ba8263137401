//! Test utilities shared by the controller tests
//!
//! Fixtures for users and sessions, a store whose writes can be made to fail
//! per key, and a mockall double of the account API.

#![allow(dead_code)]

use app_state::{SessionContext, SessionUser};
use async_trait::async_trait;
use mockall::mock;
use networking::client::Result as ApiResult;
use networking::{
    AccountApi, LoginRequest, MessageResponse, PublicUser, RegisterRequest, UpdateUserRequest,
};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use storage::kv::Result as KvResult;
use storage::{KvError, KvStore, LocalStore};

/// Siti, the default signed-in user
pub fn siti() -> SessionUser {
    user("u-siti", "Siti Aminah", "siti@example.com")
}

/// Budi, a second user
pub fn budi() -> SessionUser {
    user("u-budi", "Budi Santoso", "budi@example.com")
}

/// A user fixture
pub fn user(id: &str, name: &str, email: &str) -> SessionUser {
    SessionUser {
        id: id.to_string(),
        name: name.to_string(),
        email: email.to_string(),
        phone: "081234567890".to_string(),
        created_at: "2024-05-01T08:00:00Z".parse().unwrap(),
    }
}

/// A fresh in-memory store
pub fn memory_store() -> Arc<dyn LocalStore> {
    Arc::new(KvStore::in_memory().unwrap())
}

/// A session over `store` with nobody signed in
pub async fn signed_out(store: &Arc<dyn LocalStore>) -> Arc<SessionContext> {
    Arc::new(SessionContext::restore(Arc::clone(store)).await)
}

/// A session over `store` with `user` signed in
pub async fn signed_in(store: &Arc<dyn LocalStore>, user: SessionUser) -> Arc<SessionContext> {
    let session = signed_out(store).await;
    session.sign_in(user).await.unwrap();
    session
}

/// In-memory store that rejects writes to chosen keys
pub struct FlakyStore {
    inner: KvStore,
    failing: Mutex<HashSet<String>>,
}

impl FlakyStore {
    /// Store with every write allowed
    pub fn new() -> Arc<Self> {
        Arc::new(Self { inner: KvStore::in_memory().unwrap(), failing: Mutex::new(HashSet::new()) })
    }

    /// Make writes to `key` fail from now on
    pub fn fail_writes_to(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    /// Allow writes to `key` again
    pub fn heal(&self, key: &str) {
        self.failing.lock().unwrap().remove(key);
    }

    fn check(&self, key: &str) -> KvResult<()> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(KvError::InvalidValue(format!("write to {key} rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl LocalStore for FlakyStore {
    async fn get_item(&self, key: &str) -> KvResult<Option<String>> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> KvResult<()> {
        self.check(key)?;
        self.inner.set_item(key, value).await
    }

    async fn remove_item(&self, key: &str) -> KvResult<bool> {
        self.check(key)?;
        self.inner.remove_item(key).await
    }

    async fn compare_and_swap_item(
        &self,
        key: &str,
        current: Option<&str>,
        new: Option<&str>,
    ) -> KvResult<bool> {
        self.check(key)?;
        self.inner.compare_and_swap_item(key, current, new).await
    }
}

mock! {
    /// Account API double
    pub Accounts {}

    #[async_trait]
    impl AccountApi for Accounts {
        async fn register(&self, request: &RegisterRequest) -> ApiResult<PublicUser>;
        async fn login(&self, request: &LoginRequest) -> ApiResult<PublicUser>;
        async fn list_users(&self) -> ApiResult<Vec<PublicUser>>;
        async fn get_user(&self, id: &str) -> ApiResult<PublicUser>;
        async fn update_user(&self, id: &str, request: &UpdateUserRequest) -> ApiResult<PublicUser>;
        async fn delete_user(&self, id: &str) -> ApiResult<MessageResponse>;
    }
}
