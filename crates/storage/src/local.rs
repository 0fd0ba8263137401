//! Local Store Adapter contract
//!
//! Every screen persists its state through this asynchronous string store.
//! Values are whole JSON documents; there is no partial update.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::kv::Result;

/// Asynchronous key-value string store
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read the string stored under `key`, `None` if absent
    async fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`, returning whether it existed
    async fn remove_item(&self, key: &str) -> Result<bool>;

    /// Replace the value under `key` only if it currently equals `current`
    ///
    /// `None` stands for "absent" on either side. Returns `false` when the
    /// stored value did not match.
    async fn compare_and_swap_item(
        &self,
        key: &str,
        current: Option<&str>,
        new: Option<&str>,
    ) -> Result<bool>;
}

/// Read and decode a JSON value stored under `key`
pub async fn read_json<T>(store: &dyn LocalStore, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    match store.get_item(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encode `value` as JSON and store it under `key`
pub async fn write_json<T>(store: &dyn LocalStore, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set_item(key, &raw).await?;
    tracing::debug!(key, bytes = raw.len(), "persisted value");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KvError, KvStore};

    #[tokio::test]
    async fn test_json_helpers() {
        let kv = KvStore::in_memory().unwrap();

        write_json(&kv, "registeredEvents", &vec!["2".to_string()]).await.unwrap();
        let ids: Option<Vec<String>> = read_json(&kv, "registeredEvents").await.unwrap();
        assert_eq!(ids, Some(vec!["2".to_string()]));

        let missing: Option<Vec<String>> = read_json(&kv, "programBookmarks").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_read_json_reports_shape_mismatch() {
        let kv = KvStore::in_memory().unwrap();
        kv.set_item("eventSlots", "\"twelve\"").await.unwrap();

        let result: Result<Option<Vec<u32>>> = read_json(&kv, "eventSlots").await;
        assert!(matches!(result, Err(KvError::Serialization(_))));
    }
}
