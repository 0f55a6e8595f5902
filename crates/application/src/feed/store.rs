//! Local feed view kept consistent with the remote store.
//!
//! Mutations are confirm-then-apply: nothing changes locally until the
//! remote store has accepted the call. The state lock is never held
//! across a remote call, so any number of operations may be in flight.

use std::sync::Arc;

use civitas_domain::{
    Comment, NewPost, Post, Principal, insertion_index, sort_feed, validate_comment_text,
};
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{Clock, RemoteActor, RemoteError};

/// What happened to a refresh response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response replaced the local feed.
    Applied {
        /// Number of posts now in the feed.
        posts: usize,
    },
    /// A newer refresh was issued before this one resolved.
    Superseded,
    /// The session ended while the call was in flight.
    SessionEnded,
}

/// Session binding captured when an operation is issued.
#[derive(Debug, Clone)]
struct Ticket {
    epoch: u64,
    principal: Principal,
}

#[derive(Debug)]
struct FeedState {
    posts: Vec<Post>,
    principal: Option<Principal>,
    /// Bumped on every session change; results from older epochs are dropped.
    epoch: u64,
    /// Sequence number of the most recently issued refresh.
    refresh_issued: u64,
    next_comment_id: u64,
}

impl FeedState {
    fn ticket(&self) -> ApplicationResult<Ticket> {
        let principal = self
            .principal
            .clone()
            .ok_or(ApplicationError::NotAuthenticated)?;
        Ok(Ticket {
            epoch: self.epoch,
            principal,
        })
    }

    fn ensure_post(&self, post_id: u64) -> ApplicationResult<()> {
        if self.posts.iter().any(|p| p.id == post_id) {
            Ok(())
        } else {
            Err(ApplicationError::NotFound { post_id })
        }
    }

    fn post_mut(&mut self, post_id: u64) -> Option<&mut Post> {
        self.posts.iter_mut().find(|p| p.id == post_id)
    }

    fn reseed_comment_ids(&mut self) {
        let highest = self.posts.iter().filter_map(Post::max_comment_id).max();
        if let Some(highest) = highest {
            self.next_comment_id = self.next_comment_id.max(highest.saturating_add(1));
        }
    }
}

/// In-memory feed backed by a remote store.
///
/// `FeedStore` is the only writer of the feed; everyone else reads
/// snapshots or subscribes to changes.
pub struct FeedStore<R: RemoteActor, C: Clock> {
    remote: Arc<R>,
    clock: Arc<C>,
    state: RwLock<FeedState>,
    snapshots: watch::Sender<Vec<Post>>,
}

impl<R: RemoteActor, C: Clock> FeedStore<R, C> {
    /// Creates an empty, detached feed.
    pub fn new(remote: Arc<R>, clock: Arc<C>) -> Self {
        let (snapshots, _) = watch::channel(Vec::new());
        Self {
            remote,
            clock,
            state: RwLock::new(FeedState {
                posts: Vec::new(),
                principal: None,
                epoch: 0,
                refresh_issued: 0,
                next_comment_id: 1,
            }),
            snapshots,
        }
    }

    /// Binds the feed to an authenticated principal.
    ///
    /// Binding a different principal than the current one discards the
    /// feed first.
    pub async fn attach(&self, principal: Principal) {
        let mut state = self.state.write().await;
        if state.principal.as_ref() == Some(&principal) {
            return;
        }
        if !state.posts.is_empty() {
            state.posts.clear();
            self.snapshots.send_replace(Vec::new());
        }
        state.epoch += 1;
        debug!(principal = %principal, epoch = state.epoch, "feed attached");
        state.principal = Some(principal);
    }

    /// Discards the feed and detaches it from any session.
    ///
    /// Results of calls still in flight are dropped when they resolve.
    pub async fn clear(&self) {
        let mut state = self.state.write().await;
        state.posts.clear();
        state.principal = None;
        state.epoch += 1;
        debug!(epoch = state.epoch, "feed cleared");
        self.snapshots.send_replace(Vec::new());
    }

    /// Whether the feed is bound to a session.
    pub async fn is_attached(&self) -> bool {
        self.state.read().await.principal.is_some()
    }

    /// Returns a copy of the feed, most recent first.
    pub async fn snapshot(&self) -> Vec<Post> {
        self.state.read().await.posts.clone()
    }

    /// Returns a copy of one post.
    pub async fn post(&self, post_id: u64) -> Option<Post> {
        self.state
            .read()
            .await
            .posts
            .iter()
            .find(|p| p.id == post_id)
            .cloned()
    }

    /// Number of posts in the feed.
    pub async fn len(&self) -> usize {
        self.state.read().await.posts.len()
    }

    /// Returns true if the feed holds no posts.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.posts.is_empty()
    }

    /// Subscribes to feed snapshots published after each applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Post>> {
        self.snapshots.subscribe()
    }

    /// Replaces the feed with the remote store's posts.
    ///
    /// Last-issued wins: a response is dropped if a newer refresh was
    /// issued before it resolved.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if the feed is detached
    /// - `Remote` if the call fails; the feed is left unchanged
    pub async fn refresh(&self) -> ApplicationResult<RefreshOutcome> {
        let (ticket, seq) = {
            let mut state = self.state.write().await;
            let ticket = state.ticket()?;
            state.refresh_issued += 1;
            (ticket, state.refresh_issued)
        };

        debug!(seq, "refresh issued");
        let mut posts = self.remote.get_posts().await?;

        let mut state = self.state.write().await;
        if state.epoch != ticket.epoch {
            debug!(seq, "refresh dropped: session ended");
            return Ok(RefreshOutcome::SessionEnded);
        }
        if seq != state.refresh_issued {
            debug!(seq, latest = state.refresh_issued, "refresh superseded");
            return Ok(RefreshOutcome::Superseded);
        }

        sort_feed(&mut posts);
        state.posts = posts;
        state.reseed_comment_ids();
        let count = state.posts.len();
        self.snapshots.send_replace(state.posts.clone());
        info!(seq, posts = count, "feed refreshed");

        Ok(RefreshOutcome::Applied { posts: count })
    }

    /// Publishes a post.
    ///
    /// On success the confirmed post, carrying the id assigned by the
    /// remote store, is placed at the front of the feed.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if the feed is detached or the session ended
    ///   while the call was in flight
    /// - `Validation` if `content` is blank or `file_url` is malformed
    /// - `Remote` if the call fails
    pub async fn create_post(&self, content: &str, file_url: &str) -> ApplicationResult<u64> {
        let ticket = self.state.read().await.ticket()?;
        let draft = NewPost::new(content, file_url)?;

        debug!("createPost issued");
        let id = self
            .remote
            .create_post(draft.content(), draft.file_url())
            .await?;

        let mut state = self.state.write().await;
        if state.epoch != ticket.epoch {
            warn!(post_id = id, "createPost confirmed after session ended; result dropped");
            return Err(ApplicationError::NotAuthenticated);
        }

        // A refresh that resolved first may already carry the post.
        if state.posts.iter().any(|p| p.id == id) {
            debug!(post_id = id, "confirmed post already in feed");
        } else {
            let post = Post::confirmed(id, draft, ticket.principal, self.clock.now());
            let index = insertion_index(&state.posts, &post);
            state.posts.insert(index, post);
            self.snapshots.send_replace(state.posts.clone());
        }
        info!(post_id = id, "post created");

        Ok(id)
    }

    /// Likes a post. Repeated likes each count.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if the feed is detached or the session ended
    ///   while the call was in flight
    /// - `NotFound` if the post is not in the local feed
    /// - `Remote` if the call fails or the store declines it
    pub async fn like_post(&self, post_id: u64) -> ApplicationResult<()> {
        let ticket = {
            let state = self.state.read().await;
            let ticket = state.ticket()?;
            state.ensure_post(post_id)?;
            ticket
        };

        debug!(post_id, "likePost issued");
        if !self.remote.like_post(post_id).await? {
            return Err(RemoteError::Rejected {
                operation: "likePost",
            }
            .into());
        }

        let mut state = self.state.write().await;
        if state.epoch != ticket.epoch {
            warn!(post_id, "likePost confirmed after session ended; result dropped");
            return Err(ApplicationError::NotAuthenticated);
        }

        if let Some(post) = state.post_mut(post_id) {
            post.like_count = post.like_count.saturating_add(1);
            debug!(post_id, likes = post.like_count, "like applied");
            self.snapshots.send_replace(state.posts.clone());
        } else {
            debug!(post_id, "liked post no longer in feed");
        }

        Ok(())
    }

    /// Appends a comment to a post.
    ///
    /// # Errors
    ///
    /// - `NotAuthenticated` if the feed is detached or the session ended
    ///   while the call was in flight
    /// - `Validation` if `text` is blank
    /// - `NotFound` if the post is not in the local feed
    /// - `Remote` if the call fails or the store declines it
    pub async fn add_comment(&self, post_id: u64, text: &str) -> ApplicationResult<Comment> {
        let ticket = {
            let state = self.state.read().await;
            let ticket = state.ticket()?;
            validate_comment_text(text)?;
            state.ensure_post(post_id)?;
            ticket
        };

        debug!(post_id, "addComment issued");
        if !self.remote.add_comment(post_id, text).await? {
            return Err(RemoteError::Rejected {
                operation: "addComment",
            }
            .into());
        }

        let mut state = self.state.write().await;
        if state.epoch != ticket.epoch {
            warn!(post_id, "addComment confirmed after session ended; result dropped");
            return Err(ApplicationError::NotAuthenticated);
        }

        let comment = Comment {
            id: state.next_comment_id,
            text: text.to_string(),
            author: ticket.principal,
            created_at: self.clock.now(),
        };
        state.next_comment_id += 1;

        if let Some(post) = state.post_mut(post_id) {
            post.comments.push(comment.clone());
            self.snapshots.send_replace(state.posts.clone());
        } else {
            debug!(post_id, "commented post no longer in feed");
        }

        Ok(comment)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::Mutex;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Remote store that answers every call from scripted fields.
    #[derive(Default)]
    struct StubRemote {
        next_id: Mutex<u64>,
        posts: Mutex<Vec<Post>>,
        accept: Mutex<bool>,
        fail: Mutex<Option<RemoteError>>,
    }

    impl StubRemote {
        fn accepting() -> Self {
            let stub = Self::default();
            *stub.accept.lock().unwrap() = true;
            stub
        }

        fn check(&self) -> Result<(), RemoteError> {
            self.fail.lock().unwrap().clone().map_or(Ok(()), Err)
        }
    }

    impl RemoteActor for StubRemote {
        async fn create_post(&self, _content: &str, _file_url: &str) -> Result<u64, RemoteError> {
            self.check()?;
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            Ok(*next)
        }

        async fn get_posts(&self) -> Result<Vec<Post>, RemoteError> {
            self.check()?;
            Ok(self.posts.lock().unwrap().clone())
        }

        async fn like_post(&self, _id: u64) -> Result<bool, RemoteError> {
            self.check()?;
            Ok(*self.accept.lock().unwrap())
        }

        async fn add_comment(&self, _id: u64, _text: &str) -> Result<bool, RemoteError> {
            self.check()?;
            Ok(*self.accept.lock().unwrap())
        }
    }

    fn alice() -> Principal {
        Principal::new("alice").unwrap()
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn store(remote: StubRemote) -> FeedStore<StubRemote, FixedClock> {
        FeedStore::new(Arc::new(remote), Arc::new(FixedClock(at(1_000))))
    }

    fn remote_post(id: u64, secs: i64) -> Post {
        Post {
            id,
            content: format!("post {id}"),
            file_url: String::new(),
            like_count: 0,
            comments: Vec::new(),
            author: alice(),
            created_at: at(secs),
        }
    }

    #[tokio::test]
    async fn test_detached_feed_rejects_everything() {
        let feed = store(StubRemote::accepting());

        assert!(matches!(
            feed.refresh().await,
            Err(ApplicationError::NotAuthenticated)
        ));
        assert!(matches!(
            feed.create_post("hi", "").await,
            Err(ApplicationError::NotAuthenticated)
        ));
        assert!(matches!(
            feed.like_post(1).await,
            Err(ApplicationError::NotAuthenticated)
        ));
        assert!(matches!(
            feed.add_comment(1, "x").await,
            Err(ApplicationError::NotAuthenticated)
        ));
        assert!(feed.is_empty().await);
    }

    #[tokio::test]
    async fn test_refresh_sorts_remote_posts() {
        let remote = StubRemote::accepting();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10), remote_post(2, 30), remote_post(3, 20)];
        let feed = store(remote);
        feed.attach(alice()).await;

        let outcome = feed.refresh().await.unwrap();
        assert_eq!(outcome, RefreshOutcome::Applied { posts: 3 });

        let ids: Vec<u64> = feed.snapshot().await.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn test_create_post_inserts_confirmed_post_at_front() {
        let remote = StubRemote::accepting();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10)];
        *remote.next_id.lock().unwrap() = 1;
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();

        let id = feed.create_post("hello", "https://example.com/a.png").await.unwrap();
        assert_eq!(id, 2);

        let posts = feed.snapshot().await;
        assert_eq!(posts[0].id, 2);
        assert_eq!(posts[0].content, "hello");
        assert_eq!(posts[0].file_url, "https://example.com/a.png");
        assert_eq!(posts[0].author, alice());
        assert_eq!(posts[0].created_at, at(1_000));
    }

    #[tokio::test]
    async fn test_create_post_validation_happens_before_remote() {
        let remote = StubRemote::accepting();
        *remote.fail.lock().unwrap() = Some(RemoteError::Timeout);
        let feed = store(remote);
        feed.attach(alice()).await;

        let err = feed.create_post("", "").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));

        let err = feed.create_post("hi", "nope").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));

        let err = feed.create_post("hi", "").await.unwrap_err();
        assert!(matches!(err, ApplicationError::Remote(RemoteError::Timeout)));
        assert!(feed.is_empty().await);
    }

    #[tokio::test]
    async fn test_like_rejected_by_store_leaves_count() {
        let remote = StubRemote::default();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10)];
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();

        let err = feed.like_post(1).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Remote(RemoteError::Rejected { operation: "likePost" })
        ));
        assert_eq!(feed.post(1).await.unwrap().like_count, 0);
    }

    #[tokio::test]
    async fn test_like_missing_post_is_not_found() {
        let feed = store(StubRemote::accepting());
        feed.attach(alice()).await;

        assert!(matches!(
            feed.like_post(42).await,
            Err(ApplicationError::NotFound { post_id: 42 })
        ));
    }

    #[tokio::test]
    async fn test_comment_ids_continue_after_refreshed_ones() {
        let remote = StubRemote::accepting();
        let mut post = remote_post(1, 10);
        post.comments.push(Comment {
            id: 41,
            text: "earlier".to_string(),
            author: alice(),
            created_at: at(11),
        });
        *remote.posts.lock().unwrap() = vec![post];
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();

        let comment = feed.add_comment(1, "later").await.unwrap();
        assert_eq!(comment.id, 42);
        assert_eq!(comment.author, alice());

        let texts: Vec<String> = feed
            .post(1)
            .await
            .unwrap()
            .comments
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(texts, vec!["earlier", "later"]);
    }

    #[tokio::test]
    async fn test_blank_comment_rejected() {
        let remote = StubRemote::accepting();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10)];
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();

        assert!(matches!(
            feed.add_comment(1, "   ").await,
            Err(ApplicationError::Validation(_))
        ));
        assert!(feed.post(1).await.unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_clear_empties_and_detaches() {
        let remote = StubRemote::accepting();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10)];
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();
        let rx = feed.subscribe();
        assert_eq!(rx.borrow().len(), 1);

        feed.clear().await;
        assert!(feed.is_empty().await);
        assert!(!feed.is_attached().await);
        assert!(rx.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_attach_other_principal_discards_feed() {
        let remote = StubRemote::accepting();
        *remote.posts.lock().unwrap() = vec![remote_post(1, 10)];
        let feed = store(remote);
        feed.attach(alice()).await;
        feed.refresh().await.unwrap();

        feed.attach(alice()).await;
        assert_eq!(feed.len().await, 1);

        feed.attach(Principal::new("bob").unwrap()).await;
        assert!(feed.is_empty().await);
    }
}
