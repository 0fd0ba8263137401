//! Shared handler state

use std::sync::Arc;

use crate::repository::UserRepository;

/// State handed to every route
#[derive(Clone)]
pub struct AppState {
    /// User storage
    pub users: Arc<dyn UserRepository>,
    /// bcrypt work factor for new hashes
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Create state over `users`
    pub fn new(users: Arc<dyn UserRepository>, bcrypt_cost: u32) -> Self {
        Self { users, bcrypt_cost }
    }
}
