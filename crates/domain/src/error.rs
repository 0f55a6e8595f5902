//! Domain error types

use thiserror::Error;

/// Domain-level errors raised while validating user input.
///
/// Every variant is detected locally, before anything is sent to the
/// remote store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Post content is empty or whitespace.
    #[error("post content is required")]
    EmptyContent,

    /// Comment text is empty or whitespace.
    #[error("comment text is required")]
    EmptyComment,

    /// The attached file URL is malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A principal string is empty.
    #[error("principal must not be empty")]
    EmptyPrincipal,
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
