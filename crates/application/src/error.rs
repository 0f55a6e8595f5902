//! Application error types

use civitas_domain::DomainError;
use thiserror::Error;

use crate::ports::{IdentityError, RemoteError};

/// Application-level errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// The operation requires an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The targeted post is not in the local feed.
    #[error("post {post_id} not found")]
    NotFound {
        /// Id of the missing post.
        post_id: u64,
    },

    /// Input was rejected before anything was sent.
    #[error("validation error: {0}")]
    Validation(#[from] DomainError),

    /// The remote store call failed.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// The identity provider call failed.
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// A login flow is already running.
    #[error("login already in progress")]
    LoginInProgress,
}

impl ApplicationError {
    /// Classifies the error for presentation.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthenticated | Self::LoginInProgress => ErrorKind::NotAuthenticated,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Remote(_) | Self::Identity(_) => ErrorKind::RemoteFailure,
        }
    }
}

/// Categories of errors for user-facing display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Attempted outside an authenticated session.
    NotAuthenticated,
    /// Targeted post is absent from the local feed.
    NotFound,
    /// Empty required field or malformed URL.
    Validation,
    /// Remote store or identity provider failed.
    RemoteFailure,
}

impl ErrorKind {
    /// Returns a short title for the error category.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::NotAuthenticated => "Not Signed In",
            Self::NotFound => "Post Not Found",
            Self::Validation => "Invalid Input",
            Self::RemoteFailure => "Request Failed",
        }
    }

    /// True when the request was rejected locally, before any remote call.
    #[must_use]
    pub const fn is_local(self) -> bool {
        !matches!(self, Self::RemoteFailure)
    }
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ApplicationError::NotFound { post_id: 3 }.kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            ApplicationError::from(DomainError::EmptyContent).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ApplicationError::from(RemoteError::Timeout).kind(),
            ErrorKind::RemoteFailure
        );
        assert_eq!(
            ApplicationError::from(IdentityError::Cancelled).kind(),
            ErrorKind::RemoteFailure
        );
        assert_eq!(
            ApplicationError::LoginInProgress.kind(),
            ErrorKind::NotAuthenticated
        );
    }

    #[test]
    fn test_local_vs_remote() {
        assert!(ErrorKind::Validation.is_local());
        assert!(ErrorKind::NotFound.is_local());
        assert!(ErrorKind::NotAuthenticated.is_local());
        assert!(!ErrorKind::RemoteFailure.is_local());
        assert_eq!(ErrorKind::Validation.title(), "Invalid Input");
    }
}
