//! Engine (composition root)
//!
//! Wires the authentication session to the feed: entering
//! `Authenticated` refreshes the feed once, leaving it discards the feed,
//! and every feed operation is refused while no session is active.

use std::sync::Arc;

use civitas_domain::{ClientSettings, Comment, Post, Principal};
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use crate::auth::{AuthSession, AuthState};
use crate::error::ApplicationResult;
use crate::feed::{FeedStore, RefreshOutcome};
use crate::ports::{Clock, IdentityProvider, RemoteActor};

/// Session-gated feed engine.
///
/// # Example
///
/// ```ignore
/// let engine = Engine::new(remote, identity, clock, &ClientSettings::default())?;
/// engine.login().await?;
/// let id = engine.create_post("hi", "").await?;
/// engine.like_post(id).await?;
/// ```
pub struct Engine<R: RemoteActor, I: IdentityProvider, C: Clock> {
    auth: AuthSession<I>,
    feed: FeedStore<R, C>,
}

impl<R: RemoteActor, I: IdentityProvider, C: Clock> Engine<R, I, C> {
    /// Builds the engine from its collaborators.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if the configured identity provider URL is invalid.
    pub fn new(
        remote: Arc<R>,
        identity: Arc<I>,
        clock: Arc<C>,
        settings: &ClientSettings,
    ) -> ApplicationResult<Self> {
        let provider_url = settings.provider_url()?;
        Ok(Self::from_parts(
            AuthSession::new(identity, provider_url),
            FeedStore::new(remote, clock),
        ))
    }

    /// Builds the engine from an existing session and feed.
    #[must_use]
    pub const fn from_parts(auth: AuthSession<I>, feed: FeedStore<R, C>) -> Self {
        Self { auth, feed }
    }

    /// Restores a session held by the identity provider, refreshing the
    /// feed once if one is found.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce the held identity.
    pub async fn start(&self) -> ApplicationResult<Option<Principal>> {
        let restored = self.auth.restore().await?;
        if let Some(principal) = &restored {
            self.on_authenticated(principal.clone()).await;
        }
        Ok(restored)
    }

    /// Logs in and loads the feed.
    ///
    /// A failing initial refresh is logged; the login itself still succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the login flow fails or is already running.
    pub async fn login(&self) -> ApplicationResult<Principal> {
        if let Some(principal) = self.auth.state().principal() {
            return Ok(principal.clone());
        }

        let principal = self.auth.login().await?;
        self.on_authenticated(principal.clone()).await;
        Ok(principal)
    }

    /// Logs out and discards the feed.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if there is no session.
    pub async fn logout(&self) -> ApplicationResult<()> {
        self.auth.current_principal()?;
        self.feed.clear().await;
        self.auth.logout().await
    }

    /// Reloads the feed from the remote store.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` without a session, or the remote failure.
    pub async fn refresh(&self) -> ApplicationResult<RefreshOutcome> {
        self.auth.current_principal()?;
        self.feed.refresh().await
    }

    /// Publishes a post and returns its id.
    ///
    /// # Errors
    ///
    /// See [`FeedStore::create_post`].
    pub async fn create_post(&self, content: &str, file_url: &str) -> ApplicationResult<u64> {
        self.auth.current_principal()?;
        self.feed.create_post(content, file_url).await
    }

    /// Likes a post.
    ///
    /// # Errors
    ///
    /// See [`FeedStore::like_post`].
    pub async fn like_post(&self, post_id: u64) -> ApplicationResult<()> {
        self.auth.current_principal()?;
        self.feed.like_post(post_id).await
    }

    /// Comments on a post.
    ///
    /// # Errors
    ///
    /// See [`FeedStore::add_comment`].
    pub async fn add_comment(&self, post_id: u64, text: &str) -> ApplicationResult<Comment> {
        self.auth.current_principal()?;
        self.feed.add_comment(post_id, text).await
    }

    /// Current feed, most recent first.
    pub async fn feed(&self) -> Vec<Post> {
        self.feed.snapshot().await
    }

    /// Current authentication state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        self.auth.state()
    }

    /// Identity provider used for logins.
    #[must_use]
    pub const fn provider_url(&self) -> &Url {
        self.auth.provider_url()
    }

    /// Subscribes to authentication transitions.
    #[must_use]
    pub fn subscribe_auth(&self) -> watch::Receiver<AuthState> {
        self.auth.subscribe()
    }

    /// Subscribes to feed snapshots.
    #[must_use]
    pub fn subscribe_feed(&self) -> watch::Receiver<Vec<Post>> {
        self.feed.subscribe()
    }

    async fn on_authenticated(&self, principal: Principal) {
        self.feed.attach(principal).await;
        match self.feed.refresh().await {
            Ok(outcome) => info!(?outcome, "initial feed load finished"),
            Err(e) => warn!(error = %e, "initial feed load failed"),
        }
    }
}
