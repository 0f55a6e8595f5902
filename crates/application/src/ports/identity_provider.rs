//! Identity provider port

use std::future::Future;

use civitas_domain::Principal;
use url::Url;

/// Error type for identity provider calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    /// The user abandoned the login flow.
    #[error("login cancelled by user")]
    Cancelled,

    /// The provider reported a failure.
    #[error("identity provider failed: {0}")]
    Failed(String),

    /// No session is held by the provider.
    #[error("no active identity session")]
    NoSession,
}

/// Port for the external identity provider.
///
/// The redirect-based login flow is exposed as a single asynchronous
/// call that resolves to either the authenticated principal or an error.
pub trait IdentityProvider: Send + Sync {
    /// Runs the login flow against `provider_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the flow fails or is cancelled.
    fn login(
        &self,
        provider_url: &Url,
    ) -> impl Future<Output = Result<Principal, IdentityError>> + Send;

    /// Invalidates the provider-side session.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider could not be reached.
    fn logout(&self) -> impl Future<Output = Result<(), IdentityError>> + Send;

    /// Whether the provider already holds a session (queried at startup).
    fn is_authenticated(&self) -> impl Future<Output = bool> + Send;

    /// The principal of the held session.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::NoSession` when nothing is held.
    fn identity(&self) -> impl Future<Output = Result<Principal, IdentityError>> + Send;
}
