//! Versioned entity collections and id-sets
//!
//! A collection keeps every record of one entity type under a single key,
//! keyed by id and stamped with a monotonic version. Writes are
//! compare-and-swap against the exact document that was read, so two writers
//! touching different records never lose each other's changes, and a writer
//! holding a stale version of a record gets a [`CollectionError::Conflict`]
//! instead of silently overwriting it.

use indexmap::IndexMap;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

use crate::kv::KvError;
use crate::local::LocalStore;

/// Upper bound on compare-and-swap retries for one operation
const MAX_CAS_ATTEMPTS: usize = 8;

/// Collection error types
#[derive(Debug, Error)]
pub enum CollectionError {
    /// Underlying store error
    #[error("Store error: {0}")]
    Store(#[from] KvError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Record id already present
    #[error("Duplicate record id: {0}")]
    Duplicate(String),

    /// Record changed since it was read
    #[error("Version conflict on {id}: expected {expected}, found {actual}")]
    Conflict {
        /// Record id
        id: String,
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },

    /// Too many concurrent writers on the same key
    #[error("Gave up after repeated concurrent writes to {0}")]
    Contention(String),
}

/// Result type for collection operations
pub type Result<T> = std::result::Result<T, CollectionError>;

/// Where a new record goes in the collection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Newest first (forum threads)
    Front,
    /// Append (submissions, access history)
    Back,
}

/// A record together with its version stamp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Collection clock value at the last write of this record
    pub version: u64,
    /// The record
    pub value: T,
}

/// Persisted form of a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionDoc<T> {
    /// Monotonic write counter
    pub clock: u64,
    /// Records by id, in collection order
    pub entries: IndexMap<String, Versioned<T>>,
}

impl<T> Default for CollectionDoc<T> {
    fn default() -> Self {
        Self { clock: 0, entries: IndexMap::new() }
    }
}

impl<T> CollectionDoc<T> {
    /// Build a document from seed records, all at version 1
    pub fn from_records(records: impl IntoIterator<Item = (String, T)>) -> Self {
        let entries: IndexMap<String, Versioned<T>> = records
            .into_iter()
            .map(|(id, value)| (id, Versioned { version: 1, value }))
            .collect();
        let clock = if entries.is_empty() { 0 } else { 1 };
        Self { clock, entries }
    }

    /// Records in collection order
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values().map(|entry| &entry.value)
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// Read-modify-CAS loop over one JSON document
async fn update_document<D, R, F>(store: &dyn LocalStore, key: &str, mut apply: F) -> Result<R>
where
    D: Serialize + DeserializeOwned + Default + Send,
    R: Send,
    F: FnMut(&mut D) -> Result<R> + Send,
{
    for attempt in 0..MAX_CAS_ATTEMPTS {
        let raw = store.get_item(key).await?;
        let mut doc: D = match raw.as_deref() {
            Some(text) => serde_json::from_str(text)?,
            None => D::default(),
        };

        let output = apply(&mut doc)?;
        let next = serde_json::to_string(&doc)?;

        if store
            .compare_and_swap_item(key, raw.as_deref(), Some(&next))
            .await?
        {
            tracing::debug!(key, attempt, "collection write committed");
            return Ok(output);
        }

        tracing::debug!(key, attempt, "concurrent write detected, retrying");
    }

    tracing::warn!(key, "collection write abandoned under contention");
    Err(CollectionError::Contention(key.to_string()))
}

/// Versioned collection stored under one key
pub struct Collection<T> {
    store: Arc<dyn LocalStore>,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
{
    /// Create a handle for the collection under `key`
    pub fn new(store: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into(), _marker: PhantomData }
    }

    /// The storage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the persisted document, `None` if the key is absent
    pub async fn load(&self) -> Result<Option<CollectionDoc<T>>> {
        match self.store.get_item(&self.key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Persist `records` if nothing is stored yet and return what is stored
    ///
    /// When another writer seeds first, its document wins and is returned.
    pub async fn seed(&self, records: Vec<(String, T)>) -> Result<CollectionDoc<T>> {
        let seeded = CollectionDoc::from_records(records);
        let raw = serde_json::to_string(&seeded)?;

        for _ in 0..MAX_CAS_ATTEMPTS {
            if let Some(existing) = self.load().await? {
                return Ok(existing);
            }
            if self
                .store
                .compare_and_swap_item(&self.key, None, Some(&raw))
                .await?
            {
                tracing::debug!(key = %self.key, records = seeded.entries.len(), "seeded collection");
                return Ok(seeded);
            }
        }

        Err(CollectionError::Contention(self.key.clone()))
    }

    /// Records in collection order (empty when absent)
    pub async fn values(&self) -> Result<Vec<T>> {
        Ok(self
            .load()
            .await?
            .map(|doc| doc.values().cloned().collect())
            .unwrap_or_default())
    }

    /// A single record with its version
    pub async fn get(&self, id: &str) -> Result<Option<Versioned<T>>> {
        Ok(self
            .load()
            .await?
            .and_then(|mut doc| doc.entries.swap_remove(id)))
    }

    /// Insert a new record
    pub async fn insert(&self, id: &str, value: T, position: Position) -> Result<Versioned<T>> {
        update_document(self.store.as_ref(), &self.key, |doc: &mut CollectionDoc<T>| {
            if doc.entries.contains_key(id) {
                return Err(CollectionError::Duplicate(id.to_string()));
            }
            let entry = Versioned { version: doc.tick(), value: value.clone() };
            match position {
                Position::Front => {
                    doc.entries.shift_insert(0, id.to_string(), entry.clone());
                }
                Position::Back => {
                    doc.entries.insert(id.to_string(), entry.clone());
                }
            }
            Ok(entry)
        })
        .await
    }

    /// Replace a record if it is still at `expected_version`
    pub async fn replace(&self, id: &str, expected_version: u64, value: T) -> Result<Versioned<T>> {
        update_document(self.store.as_ref(), &self.key, |doc: &mut CollectionDoc<T>| {
            let actual = doc
                .entries
                .get(id)
                .map(|entry| entry.version)
                .ok_or_else(|| CollectionError::NotFound(id.to_string()))?;
            if actual != expected_version {
                return Err(CollectionError::Conflict {
                    id: id.to_string(),
                    expected: expected_version,
                    actual,
                });
            }
            let entry = Versioned { version: doc.tick(), value: value.clone() };
            doc.entries.insert(id.to_string(), entry.clone());
            Ok(entry)
        })
        .await
    }

    /// Apply `f` to the latest stored version of a record
    pub async fn modify<F>(&self, id: &str, f: F) -> Result<Versioned<T>>
    where
        F: Fn(&T) -> T + Send + Sync,
    {
        update_document(self.store.as_ref(), &self.key, |doc: &mut CollectionDoc<T>| {
            let next = doc
                .entries
                .get(id)
                .map(|entry| f(&entry.value))
                .ok_or_else(|| CollectionError::NotFound(id.to_string()))?;
            let entry = Versioned { version: doc.tick(), value: next };
            doc.entries.insert(id.to_string(), entry.clone());
            Ok(entry)
        })
        .await
    }

    /// Remove a record, optionally guarded by its version
    pub async fn remove(&self, id: &str, expected_version: Option<u64>) -> Result<T> {
        update_document(self.store.as_ref(), &self.key, |doc: &mut CollectionDoc<T>| {
            let actual = doc
                .entries
                .get(id)
                .map(|entry| entry.version)
                .ok_or_else(|| CollectionError::NotFound(id.to_string()))?;
            if let Some(expected) = expected_version {
                if expected != actual {
                    return Err(CollectionError::Conflict {
                        id: id.to_string(),
                        expected,
                        actual,
                    });
                }
            }
            doc.tick();
            doc.entries
                .shift_remove(id)
                .map(|entry| entry.value)
                .ok_or_else(|| CollectionError::NotFound(id.to_string()))
        })
        .await
    }
}

/// Set of ids stored as a JSON array under one key
///
/// Membership is the single source of truth for relations such as
/// enrollments, bookmarks, likes and event registrations.
#[derive(Clone)]
pub struct IdSet {
    store: Arc<dyn LocalStore>,
    key: String,
}

impl IdSet {
    /// Create a handle for the id-set under `key`
    pub fn new(store: Arc<dyn LocalStore>, key: impl Into<String>) -> Self {
        Self { store, key: key.into() }
    }

    /// The storage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// All ids in insertion order
    pub async fn list(&self) -> Result<Vec<String>> {
        match self.store.get_item(&self.key).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Whether `id` is a member
    pub async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.list().await?.iter().any(|member| member == id))
    }

    /// Add `id`, returning false if it was already present
    pub async fn insert(&self, id: &str) -> Result<bool> {
        update_document(self.store.as_ref(), &self.key, |ids: &mut Vec<String>| {
            if ids.iter().any(|member| member == id) {
                return Ok(false);
            }
            ids.push(id.to_string());
            Ok(true)
        })
        .await
    }

    /// Remove `id`, returning false if it was absent
    pub async fn remove(&self, id: &str) -> Result<bool> {
        update_document(self.store.as_ref(), &self.key, |ids: &mut Vec<String>| {
            let before = ids.len();
            ids.retain(|member| member != id);
            Ok(ids.len() != before)
        })
        .await
    }

    /// Flip membership of `id`, returning the new membership
    pub async fn toggle(&self, id: &str) -> Result<bool> {
        update_document(self.store.as_ref(), &self.key, |ids: &mut Vec<String>| {
            if let Some(index) = ids.iter().position(|member| member == id) {
                ids.remove(index);
                Ok(false)
            } else {
                ids.push(id.to_string());
                Ok(true)
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::KvStore;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Thread {
        title: String,
        likes: u32,
    }

    fn thread(title: &str, likes: u32) -> Thread {
        Thread { title: title.to_string(), likes }
    }

    fn store() -> Arc<dyn LocalStore> {
        Arc::new(KvStore::in_memory().unwrap())
    }

    fn seed() -> Vec<(String, Thread)> {
        vec![
            ("1".to_string(), thread("Tips ekspor", 4)),
            ("2".to_string(), thread("Modal usaha", 9)),
        ]
    }

    #[tokio::test]
    async fn test_seed_is_persisted_once() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        assert!(threads.load().await.unwrap().is_none());

        let doc = threads.seed(seed()).await.unwrap();
        assert_eq!(doc.entries.len(), 2);

        // A second seed does not overwrite what is stored
        threads.modify("1", |t| thread(&t.title, t.likes + 1)).await.unwrap();
        let again = threads.seed(seed()).await.unwrap();
        assert_eq!(again.entries["1"].value.likes, 5);
    }

    #[tokio::test]
    async fn test_values_keep_seed_order() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let titles: Vec<String> = threads
            .values()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Tips ekspor", "Modal usaha"]);
    }

    #[tokio::test]
    async fn test_insert_front_and_back() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        threads.insert("3", thread("Baru", 0), Position::Front).await.unwrap();
        threads.insert("4", thread("Paling akhir", 0), Position::Back).await.unwrap();

        let doc = threads.load().await.unwrap().unwrap();
        let ids: Vec<&String> = doc.entries.keys().collect();
        assert_eq!(ids, vec!["3", "1", "2", "4"]);

        let duplicate = threads.insert("3", thread("Lagi", 0), Position::Back).await;
        assert!(matches!(duplicate, Err(CollectionError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_versions_are_monotonic() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let first = threads.modify("2", |t| thread(&t.title, t.likes + 1)).await.unwrap();
        let second = threads.modify("1", |t| thread(&t.title, t.likes + 1)).await.unwrap();
        assert!(second.version > first.version);
        assert!(first.version > 1);
    }

    #[tokio::test]
    async fn test_replace_with_stale_version_conflicts() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let read = threads.get("1").await.unwrap().unwrap();
        threads
            .replace("1", read.version, thread("Tips ekspor", 10))
            .await
            .unwrap();

        // Reusing the old version is rejected and nothing is overwritten
        let stale = threads.replace("1", read.version, thread("Tips ekspor", 0)).await;
        assert!(matches!(stale, Err(CollectionError::Conflict { .. })));
        assert_eq!(threads.get("1").await.unwrap().unwrap().value.likes, 10);
    }

    #[tokio::test]
    async fn test_update_to_other_record_does_not_conflict() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let read = threads.get("1").await.unwrap().unwrap();
        threads.modify("2", |t| thread(&t.title, 0)).await.unwrap();

        let updated = threads
            .replace("1", read.version, thread("Tips ekspor", 7))
            .await
            .unwrap();
        assert_eq!(updated.value.likes, 7);
        assert_eq!(threads.get("2").await.unwrap().unwrap().value.likes, 0);
    }

    #[tokio::test]
    async fn test_concurrent_modifies_are_not_lost() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let a = threads.clone();
        let b = threads.clone();
        let (ra, rb) = tokio::join!(
            a.modify("1", |t| thread(&t.title, t.likes + 1)),
            b.modify("2", |t| thread(&t.title, t.likes + 1)),
        );
        ra.unwrap();
        rb.unwrap();

        let values = threads.values().await.unwrap();
        assert_eq!(values[0].likes, 5);
        assert_eq!(values[1].likes, 10);
    }

    #[tokio::test]
    async fn test_remove() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        threads.seed(seed()).await.unwrap();

        let removed = threads.remove("1", None).await.unwrap();
        assert_eq!(removed.title, "Tips ekspor");
        assert!(threads.get("1").await.unwrap().is_none());

        let missing = threads.remove("1", None).await;
        assert!(matches!(missing, Err(CollectionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_modify_missing_record() {
        let threads = Collection::<Thread>::new(store(), "forumThreads");
        let result = threads.modify("99", |t| t.clone()).await;
        assert!(matches!(result, Err(CollectionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_id_set_toggle_round_trip() {
        let bookmarks = IdSet::new(store(), "programBookmarks");

        assert!(bookmarks.toggle("3").await.unwrap());
        assert!(bookmarks.contains("3").await.unwrap());
        assert!(!bookmarks.toggle("3").await.unwrap());
        assert!(bookmarks.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_id_set_insert_remove() {
        let registered = IdSet::new(store(), "registeredEvents");

        assert!(registered.insert("2").await.unwrap());
        assert!(!registered.insert("2").await.unwrap());
        assert!(registered.insert("5").await.unwrap());
        assert_eq!(registered.list().await.unwrap(), vec!["2", "5"]);

        assert!(registered.remove("2").await.unwrap());
        assert!(!registered.remove("2").await.unwrap());
    }
}
