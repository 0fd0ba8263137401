//! Shared list-screen behavior
//!
//! Every list screen loads its collection (seeding it on first use), filters
//! it in memory, and flips relations whose membership lives in an [`IdSet`].

use serde::{de::DeserializeOwned, Serialize};
use storage::{Collection, CollectionDoc, IdSet};

use crate::error::Result;

/// Category value that matches every item
pub const ALL_CATEGORIES: &str = "Semua";

/// Items that can be filtered by category and free-text query
pub trait Searchable {
    /// Category label
    fn category(&self) -> &str;

    /// Text fields matched against the query
    fn search_fields(&self) -> Vec<&str>;

    /// Whether the item passes the category and query filters
    fn matches(&self, category: Option<&str>, query: &str) -> bool {
        let category_ok = match category {
            None => true,
            Some(c) if c == ALL_CATEGORIES => true,
            Some(c) => self.category().eq_ignore_ascii_case(c),
        };
        if !category_ok {
            return false;
        }

        let query = query.trim().to_lowercase();
        query.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Items matching `category` and `query`, in their original order
pub fn filter<T>(items: &[T], category: Option<&str>, query: &str) -> Vec<T>
where
    T: Searchable + Clone,
{
    items
        .iter()
        .filter(|item| item.matches(category, query))
        .cloned()
        .collect()
}

/// Load a collection, persisting `seed` when nothing is stored yet
///
/// Read failures fall back to the seed without writing it.
pub async fn load_or_seed<T, F>(collection: &Collection<T>, seed: F) -> CollectionDoc<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    F: Fn() -> Vec<(String, T)>,
{
    match collection.load().await {
        Ok(Some(doc)) => doc,
        Ok(None) => match collection.seed(seed()).await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(key = collection.key(), error = %e, "could not persist seed data");
                CollectionDoc::from_records(seed())
            }
        },
        Err(e) => {
            tracing::warn!(key = collection.key(), error = %e, "stored data unreadable, using seed");
            CollectionDoc::from_records(seed())
        }
    }
}

/// Members of `set`, empty when unreadable
pub async fn members(set: &IdSet) -> Vec<String> {
    match set.list().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(key = set.key(), error = %e, "relation unreadable, treating as empty");
            Vec::new()
        }
    }
}

/// Flip `id` in `set` and move the record's counter with it
///
/// `adjust` receives the record and the new membership and returns the
/// updated record. If the counter write fails the membership flip is undone.
pub async fn toggle_with_counter<T, F>(
    set: &IdSet,
    collection: &Collection<T>,
    id: &str,
    adjust: F,
) -> Result<bool>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync,
    F: Fn(&T, bool) -> T + Send + Sync,
{
    if collection.get(id).await?.is_none() {
        return Err(storage::CollectionError::NotFound(id.to_string()).into());
    }

    let member = set.toggle(id).await?;
    if let Err(e) = collection.modify(id, |record| adjust(record, member)).await {
        if let Err(undo) = set.toggle(id).await {
            tracing::warn!(key = set.key(), id, error = %undo, "could not undo relation flip");
        }
        return Err(e.into());
    }

    tracing::debug!(key = set.key(), id, member, "relation toggled");
    Ok(member)
}

/// Adjust a counter by one in the direction of `up`, never below zero
pub fn step(count: u32, up: bool) -> u32 {
    if up {
        count.saturating_add(1)
    } else {
        count.saturating_sub(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::Arc;
    use storage::{KvStore, LocalStore};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        title: String,
        category: String,
        count: u32,
    }

    impl Searchable for Item {
        fn category(&self) -> &str {
            &self.category
        }

        fn search_fields(&self) -> Vec<&str> {
            vec![self.title.as_str()]
        }
    }

    fn item(title: &str, category: &str) -> Item {
        Item { title: title.to_string(), category: category.to_string(), count: 0 }
    }

    fn seed() -> Vec<(String, Item)> {
        vec![
            ("1".to_string(), item("Ekspor Kopi", "Ekspor")),
            ("2".to_string(), item("Pemasaran Digital", "Pemasaran")),
        ]
    }

    #[test]
    fn test_filter_by_category_and_query() {
        let items = vec![item("Ekspor Kopi", "Ekspor"), item("Pemasaran Digital", "Pemasaran")];

        assert_eq!(filter(&items, None, "").len(), 2);
        assert_eq!(filter(&items, Some(ALL_CATEGORIES), "").len(), 2);
        assert_eq!(filter(&items, Some("Ekspor"), "").len(), 1);
        assert_eq!(filter(&items, None, "  DIGITAL ")[0].title, "Pemasaran Digital");
        assert!(filter(&items, Some("Ekspor"), "digital").is_empty());
    }

    #[tokio::test]
    async fn test_load_or_seed_persists_seed() {
        let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
        let items = Collection::<Item>::new(Arc::clone(&store), "items");

        let doc = load_or_seed(&items, seed).await;
        let expected: Vec<Item> = seed().into_iter().map(|(_, item)| item).collect();
        assert_eq!(doc.values().cloned().collect::<Vec<_>>(), expected);
        assert!(store.get_item("items").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_or_seed_does_not_overwrite_unreadable_data() {
        let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
        store.set_item("items", "[oops").await.unwrap();
        let items = Collection::<Item>::new(Arc::clone(&store), "items");

        let doc = load_or_seed(&items, seed).await;
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(store.get_item("items").await.unwrap().as_deref(), Some("[oops"));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_flag_and_counter() {
        let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
        let items = Collection::<Item>::new(Arc::clone(&store), "items");
        let marks = IdSet::new(store, "marks");
        items.seed(seed()).await.unwrap();

        let bump =
            |record: &Item, up: bool| Item { count: step(record.count, up), ..record.clone() };

        assert!(toggle_with_counter(&marks, &items, "1", bump).await.unwrap());
        assert_eq!(items.get("1").await.unwrap().unwrap().value.count, 1);

        assert!(!toggle_with_counter(&marks, &items, "1", bump).await.unwrap());
        assert_eq!(items.get("1").await.unwrap().unwrap().value.count, 0);
        assert!(!marks.contains("1").await.unwrap());
    }

    #[tokio::test]
    async fn test_toggle_unknown_id() {
        let store: Arc<dyn LocalStore> = Arc::new(KvStore::in_memory().unwrap());
        let items = Collection::<Item>::new(Arc::clone(&store), "items");
        let marks = IdSet::new(store, "marks");
        items.seed(seed()).await.unwrap();

        let result = toggle_with_counter(&marks, &items, "9", |r: &Item, _| r.clone()).await;
        assert!(matches!(result, Err(crate::CoreError::NotFound(_))));
        assert!(marks.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_step_never_underflows() {
        assert_eq!(step(0, false), 0);
        assert_eq!(step(3, true), 4);
    }
}
