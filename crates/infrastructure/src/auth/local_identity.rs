//! Identity provider that runs entirely in-process.
//!
//! Every login succeeds with a fixed principal unless a failure has been
//! queued with [`LocalIdentityProvider::fail_next_login`]. The binary uses
//! it for local runs; tests use it to script provider behavior.

use civitas_application::{IdentityError, IdentityProvider};
use civitas_domain::Principal;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

#[derive(Debug)]
struct ProviderState {
    session: Option<Principal>,
    next_failure: Option<IdentityError>,
    fail_logout: bool,
}

/// In-process identity provider.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    principal: Principal,
    state: Mutex<ProviderState>,
}

impl LocalIdentityProvider {
    /// Creates a provider that signs in as `principal`. No session is held.
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self::build(principal, None)
    }

    /// Creates a provider that already holds a session for `principal`.
    #[must_use]
    pub fn with_session(principal: Principal) -> Self {
        Self::build(principal.clone(), Some(principal))
    }

    fn build(principal: Principal, session: Option<Principal>) -> Self {
        Self {
            principal,
            state: Mutex::new(ProviderState {
                session,
                next_failure: None,
                fail_logout: false,
            }),
        }
    }

    /// The principal this provider signs in as.
    #[must_use]
    pub const fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Makes the next login attempt fail with `error`.
    pub async fn fail_next_login(&self, error: IdentityError) {
        self.state.lock().await.next_failure = Some(error);
    }

    /// Makes logout calls report a provider failure.
    pub async fn set_fail_logout(&self, fail: bool) {
        self.state.lock().await.fail_logout = fail;
    }
}

impl IdentityProvider for LocalIdentityProvider {
    async fn login(&self, provider_url: &Url) -> Result<Principal, IdentityError> {
        debug!(%provider_url, "starting local login flow");
        let mut state = self.state.lock().await;

        if let Some(error) = state.next_failure.take() {
            return Err(error);
        }

        state.session = Some(self.principal.clone());
        info!(principal = %self.principal.short(), "local identity issued");
        Ok(self.principal.clone())
    }

    async fn logout(&self) -> Result<(), IdentityError> {
        let mut state = self.state.lock().await;
        state.session = None;
        if state.fail_logout {
            return Err(IdentityError::Failed("logout endpoint unreachable".to_string()));
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> bool {
        self.state.lock().await.session.is_some()
    }

    async fn identity(&self) -> Result<Principal, IdentityError> {
        self.state
            .lock()
            .await
            .session
            .clone()
            .ok_or(IdentityError::NoSession)
    }
}
