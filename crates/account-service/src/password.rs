//! bcrypt hashing off the async runtime

use crate::error::{Result, ServiceError};

/// Hash `password` with a fresh salt
pub async fn hash(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ServiceError::Hashing(e.to_string()))?
        .map_err(|e| ServiceError::Hashing(e.to_string()))
}

/// Check `password` against a stored hash
pub async fn verify(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ServiceError::Hashing(e.to_string()))?
        .map_err(|e| ServiceError::Hashing(e.to_string()))
}
