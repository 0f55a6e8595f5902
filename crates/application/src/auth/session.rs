//! Authentication session state machine.
//!
//! `Unauthenticated -> Authenticating -> Authenticated`, and back to
//! `Unauthenticated` on logout. A failed or cancelled login returns to
//! `Unauthenticated` directly.

use std::sync::Arc;

use civitas_domain::Principal;
use tokio::sync::watch;
use tracing::{info, warn};
use url::Url;

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::IdentityProvider;

/// Authentication state of the running client.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No session.
    #[default]
    Unauthenticated,
    /// Waiting for the identity provider to finish the login flow.
    Authenticating,
    /// A verified session is active.
    Authenticated {
        /// The authenticated identity.
        principal: Principal,
    },
}

impl AuthState {
    /// Returns true when a session is active.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    /// The active principal, if any.
    #[must_use]
    pub const fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Authenticated { principal } => Some(principal),
            _ => None,
        }
    }

    /// Get a user-friendly message.
    #[must_use]
    pub const fn message(&self) -> &str {
        match self {
            Self::Unauthenticated => "Not signed in",
            Self::Authenticating => "Waiting for identity provider...",
            Self::Authenticated { .. } => "Signed in",
        }
    }
}

/// Owns the session and the identity provider behind it.
///
/// There is one `AuthSession` per running client. Observers follow
/// transitions through [`AuthSession::subscribe`].
pub struct AuthSession<I: IdentityProvider> {
    provider: Arc<I>,
    provider_url: Url,
    state: watch::Sender<AuthState>,
}

impl<I: IdentityProvider> AuthSession<I> {
    /// Creates an unauthenticated session using `provider_url` for logins.
    #[must_use]
    pub fn new(provider: Arc<I>, provider_url: Url) -> Self {
        let (state, _) = watch::channel(AuthState::Unauthenticated);
        Self {
            provider,
            provider_url,
            state,
        }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Subscribes to state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The identity provider URL used for logins.
    #[must_use]
    pub const fn provider_url(&self) -> &Url {
        &self.provider_url
    }

    /// Returns the authenticated principal.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` unless the state is `Authenticated`.
    pub fn current_principal(&self) -> ApplicationResult<Principal> {
        self.state
            .borrow()
            .principal()
            .cloned()
            .ok_or(ApplicationError::NotAuthenticated)
    }

    /// Adopts a session the provider already holds (e.g. from a previous run).
    ///
    /// Returns the restored principal, or `None` when the provider holds
    /// no session or a session is already active here.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider claims a session but cannot
    /// produce its identity.
    pub async fn restore(&self) -> ApplicationResult<Option<Principal>> {
        if *self.state.borrow() != AuthState::Unauthenticated {
            return Ok(None);
        }
        if !self.provider.is_authenticated().await {
            return Ok(None);
        }

        let principal = self.provider.identity().await?;
        let adopted = self.state.send_if_modified(|state| {
            if *state == AuthState::Unauthenticated {
                *state = AuthState::Authenticated {
                    principal: principal.clone(),
                };
                true
            } else {
                false
            }
        });

        if adopted {
            info!(principal = %principal, "restored previous session");
            Ok(Some(principal))
        } else {
            Ok(None)
        }
    }

    /// Runs the login flow.
    ///
    /// Already authenticated sessions return their principal without
    /// contacting the provider.
    ///
    /// # Errors
    ///
    /// - `LoginInProgress` if another login is running
    /// - `Identity` if the provider fails or the user cancels; the state
    ///   is back to `Unauthenticated` in that case
    pub async fn login(&self) -> ApplicationResult<Principal> {
        let mut previous = AuthState::Unauthenticated;
        let started = self.state.send_if_modified(|state| {
            if *state == AuthState::Unauthenticated {
                *state = AuthState::Authenticating;
                true
            } else {
                previous = state.clone();
                false
            }
        });

        if !started {
            return match previous {
                AuthState::Authenticated { principal } => Ok(principal),
                _ => Err(ApplicationError::LoginInProgress),
            };
        }

        info!(provider = %self.provider_url, "login started");
        match self.provider.login(&self.provider_url).await {
            Ok(principal) => {
                self.state.send_replace(AuthState::Authenticated {
                    principal: principal.clone(),
                });
                info!(principal = %principal, "login succeeded");
                Ok(principal)
            }
            Err(e) => {
                self.state.send_replace(AuthState::Unauthenticated);
                warn!(error = %e, "login failed");
                Err(e.into())
            }
        }
    }

    /// Ends the session.
    ///
    /// The state always ends `Unauthenticated`, even if the provider
    /// fails to invalidate its side.
    ///
    /// # Errors
    ///
    /// Returns `NotAuthenticated` if there is no session to end.
    pub async fn logout(&self) -> ApplicationResult<()> {
        let principal = self.current_principal()?;

        if let Err(e) = self.provider.logout().await {
            warn!(error = %e, "identity provider logout failed; clearing session anyway");
        }

        self.state.send_replace(AuthState::Unauthenticated);
        info!(principal = %principal, "logged out");
        Ok(())
    }
}
