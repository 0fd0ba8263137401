//! Community forum
//!
//! Threads are newest first in `forumThreads`; replies of a thread live in
//! `threadReplies_<id>`. Likes are membership in `likedThreads`, mirrored by
//! the thread's `likes` counter.

use app_state::SessionContext;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{keys, Collection, IdSet, LocalStore, Position};

use crate::catalog::{self, Searchable};
use crate::error::{CoreError, Result};
use crate::ids;
use crate::validation;

/// A forum thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thread {
    /// Thread id
    pub id: String,
    /// Title
    pub title: String,
    /// Body text
    pub content: String,
    /// Category
    pub category: String,
    /// Author display name
    pub author: String,
    /// Author user id; seeded threads have none
    #[serde(default)]
    pub author_id: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Like counter
    pub likes: u32,
    /// Reply counter
    pub replies: u32,
}

/// A reply to a thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    /// Reply id
    pub id: String,
    /// Parent thread
    pub thread_id: String,
    /// Body text
    pub content: String,
    /// Author display name
    pub author: String,
    /// Author user id
    pub author_id: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Input for a new thread
#[derive(Debug, Clone, Default)]
pub struct NewThread {
    /// Title (required)
    pub title: String,
    /// Body text (required)
    pub content: String,
    /// Category; blank means "Umum"
    pub category: String,
}

/// A thread with the user's like state
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadView {
    /// The thread
    pub thread: Thread,
    /// Whether the user liked it
    pub is_liked: bool,
}

impl Searchable for ThreadView {
    fn category(&self) -> &str {
        &self.thread.category
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.thread.title.as_str(),
            self.thread.content.as_str(),
            self.thread.author.as_str(),
        ]
    }
}

const DEFAULT_CATEGORY: &str = "Umum";

fn seed_thread(
    id: &str,
    title: &str,
    content: &str,
    category: &str,
    author: &str,
    created_at: &str,
    likes: u32,
) -> (String, Thread) {
    let thread = Thread {
        id: id.to_string(),
        title: title.to_string(),
        content: content.to_string(),
        category: category.to_string(),
        author: author.to_string(),
        author_id: None,
        created_at: DateTime::parse_from_rfc3339(created_at)
            .map(|time| time.with_timezone(&Utc))
            .unwrap_or_default(),
        likes,
        replies: 0,
    };
    (thread.id.clone(), thread)
}

/// Threads shown before anyone posts
pub fn seed_threads() -> Vec<(String, Thread)> {
    vec![
        seed_thread(
            "1",
            "Tips mengurus NIB lewat OSS untuk pemula",
            "Saya baru saja mengurus NIB lewat OSS RBA. Siapkan KTP dan NPWP, lalu pilih KBLI yang sesuai.",
            "Perizinan",
            "Rina Wulandari",
            "2024-11-02T08:15:00Z",
            24,
        ),
        seed_thread(
            "2",
            "Pengalaman mengajukan KUR 50 juta",
            "Prosesnya sekitar dua minggu. Catatan keuangan yang rapi sangat membantu saat survei.",
            "Pembiayaan",
            "Ahmad Fauzi",
            "2024-11-05T10:30:00Z",
            31,
        ),
        seed_thread(
            "3",
            "Cara meningkatkan penjualan di marketplace",
            "Foto produk yang terang dan deskripsi lengkap menaikkan konversi toko saya hampir dua kali.",
            "Pemasaran",
            "Dewi Lestari",
            "2024-11-08T14:45:00Z",
            18,
        ),
        seed_thread(
            "4",
            "Sertifikasi halal gratis, ada yang sudah coba?",
            "Program SEHATI dibuka lagi. Apakah ada yang sudah lolos verifikasi pendamping halal?",
            "Sertifikasi",
            "Bambang Sutrisno",
            "2024-11-10T09:00:00Z",
            12,
        ),
    ]
}

/// Forum screen controller
pub struct ForumController {
    store: Arc<dyn LocalStore>,
    session: Arc<SessionContext>,
    threads: Collection<Thread>,
    liked: IdSet,
}

impl ForumController {
    /// Create a controller over `store`
    pub fn new(store: Arc<dyn LocalStore>, session: Arc<SessionContext>) -> Self {
        Self {
            threads: Collection::new(Arc::clone(&store), keys::FORUM_THREADS),
            liked: IdSet::new(Arc::clone(&store), keys::LIKED_THREADS),
            store,
            session,
        }
    }

    fn replies_of(&self, thread_id: &str) -> Collection<Reply> {
        Collection::new(Arc::clone(&self.store), keys::thread_replies(thread_id))
    }

    /// All threads, newest first, with like state
    pub async fn load(&self) -> Vec<ThreadView> {
        let doc = catalog::load_or_seed(&self.threads, seed_threads).await;
        let liked = catalog::members(&self.liked).await;

        doc.values()
            .map(|thread| ThreadView {
                is_liked: liked.contains(&thread.id),
                thread: thread.clone(),
            })
            .collect()
    }

    /// Filter loaded threads by category and query
    pub fn filter(threads: &[ThreadView], category: Option<&str>, query: &str) -> Vec<ThreadView> {
        catalog::filter(threads, category, query)
    }

    /// Like or unlike thread `id`, returning whether it is now liked
    pub async fn toggle_like(&self, id: &str) -> Result<bool> {
        self.threads.seed(seed_threads()).await?;
        catalog::toggle_with_counter(&self.liked, &self.threads, id, |thread, liked| Thread {
            likes: catalog::step(thread.likes, liked),
            ..thread.clone()
        })
        .await
    }

    /// Post a new thread as the signed-in user
    pub async fn create_thread(&self, input: NewThread) -> Result<Thread> {
        let user = self.session.require_user()?;
        let title = validation::require("title", &input.title)?;
        let content = validation::require("content", &input.content)?;
        let category = match input.category.trim() {
            "" => DEFAULT_CATEGORY,
            category => category,
        };

        let thread = Thread {
            id: ids::next_id(),
            title: title.to_string(),
            content: content.to_string(),
            category: category.to_string(),
            author: user.name,
            author_id: Some(user.id),
            created_at: Utc::now(),
            likes: 0,
            replies: 0,
        };

        self.threads.seed(seed_threads()).await?;
        self.threads.insert(&thread.id, thread.clone(), Position::Front).await?;

        tracing::info!(thread_id = %thread.id, "thread posted");
        Ok(thread)
    }

    /// Replies of `thread_id` in posting order
    pub async fn replies(&self, thread_id: &str) -> Vec<Reply> {
        match self.replies_of(thread_id).values().await {
            Ok(replies) => replies,
            Err(e) => {
                tracing::warn!(thread_id, error = %e, "replies unreadable");
                Vec::new()
            }
        }
    }

    /// Reply to `thread_id` as the signed-in user
    pub async fn add_reply(&self, thread_id: &str, content: &str) -> Result<Reply> {
        let user = self.session.require_user()?;
        let content = validation::require("content", content)?;

        if self.threads.seed(seed_threads()).await?.entries.get(thread_id).is_none() {
            return Err(CoreError::NotFound(thread_id.to_string()));
        }

        let reply = Reply {
            id: ids::next_id(),
            thread_id: thread_id.to_string(),
            content: content.to_string(),
            author: user.name,
            author_id: user.id,
            created_at: Utc::now(),
        };
        self.replies_of(thread_id)
            .insert(&reply.id, reply.clone(), Position::Back)
            .await?;

        if let Err(e) = self
            .threads
            .modify(thread_id, |thread| Thread { replies: thread.replies + 1, ..thread.clone() })
            .await
        {
            tracing::warn!(thread_id, error = %e, "reply stored but counter not updated");
        }

        tracing::debug!(thread_id, reply_id = %reply.id, "reply posted");
        Ok(reply)
    }

    /// Delete a thread written by the signed-in user, with its replies
    pub async fn delete_thread(&self, id: &str) -> Result<Thread> {
        let user = self.session.require_user()?;
        let current = self
            .threads
            .get(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if current.value.author_id.as_deref() != Some(user.id.as_str()) {
            return Err(CoreError::NotAuthor);
        }

        let removed = self.threads.remove(id, Some(current.version)).await?;

        if let Err(e) = self.store.remove_item(&keys::thread_replies(id)).await {
            tracing::warn!(thread_id = id, error = %e, "could not remove replies");
        }
        if let Err(e) = self.liked.remove(id).await {
            tracing::warn!(thread_id = id, error = %e, "could not clear like");
        }

        tracing::info!(thread_id = id, "thread deleted");
        Ok(removed)
    }
}
