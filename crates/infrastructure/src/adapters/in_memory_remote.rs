//! In-process remote store.
//!
//! Behaves like the production service: ids are assigned monotonically
//! starting at 1, likes are never deduplicated, and operations on unknown
//! post ids answer `false` instead of failing. Used for local development
//! and as a substitute in tests.

use std::sync::Arc;

use civitas_application::{Clock, RemoteActor, RemoteError};
use civitas_domain::{Comment, Post, Principal};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug)]
struct Ledger {
    posts: Vec<Post>,
    next_post_id: u64,
    next_comment_id: u64,
    caller: Principal,
}

/// Authoritative feed store living in the current process.
pub struct InMemoryRemoteActor<C: Clock> {
    clock: Arc<C>,
    ledger: Mutex<Ledger>,
}

impl<C: Clock> InMemoryRemoteActor<C> {
    /// Creates an empty store. Writes are attributed to `caller`.
    pub fn new(clock: Arc<C>, caller: Principal) -> Self {
        Self {
            clock,
            ledger: Mutex::new(Ledger {
                posts: Vec::new(),
                next_post_id: 1,
                next_comment_id: 1,
                caller,
            }),
        }
    }

    /// Attributes subsequent writes to `caller`.
    pub async fn set_caller(&self, caller: Principal) {
        self.ledger.lock().await.caller = caller;
    }

    /// Number of stored posts.
    pub async fn post_count(&self) -> usize {
        self.ledger.lock().await.posts.len()
    }
}

impl<C: Clock> RemoteActor for InMemoryRemoteActor<C> {
    async fn create_post(&self, content: &str, file_url: &str) -> Result<u64, RemoteError> {
        let mut ledger = self.ledger.lock().await;
        let id = ledger.next_post_id;
        ledger.next_post_id += 1;

        let post = Post {
            id,
            content: content.to_string(),
            file_url: file_url.to_string(),
            like_count: 0,
            comments: Vec::new(),
            author: ledger.caller.clone(),
            created_at: self.clock.now(),
        };
        ledger.posts.push(post);
        debug!(post_id = id, "stored post");

        Ok(id)
    }

    async fn get_posts(&self) -> Result<Vec<Post>, RemoteError> {
        Ok(self.ledger.lock().await.posts.clone())
    }

    async fn like_post(&self, id: u64) -> Result<bool, RemoteError> {
        let mut ledger = self.ledger.lock().await;
        let Some(post) = ledger.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        post.like_count = post.like_count.saturating_add(1);
        Ok(true)
    }

    async fn add_comment(&self, id: u64, text: &str) -> Result<bool, RemoteError> {
        let mut ledger = self.ledger.lock().await;
        let comment = Comment {
            id: ledger.next_comment_id,
            text: text.to_string(),
            author: ledger.caller.clone(),
            created_at: self.clock.now(),
        };

        let Some(post) = ledger.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(false);
        };
        post.comments.push(comment);
        ledger.next_comment_id += 1;
        Ok(true)
    }
}
