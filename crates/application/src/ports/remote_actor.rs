//! Remote actor port
//!
//! The remote actor is the authoritative store for the feed. The client
//! only mirrors what it confirms.

use std::future::Future;

use civitas_domain::Post;

/// Error type for remote store calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The transport failed (connection, TLS, protocol).
    #[error("transport error: {0}")]
    Transport(String),

    /// The call did not complete in time.
    #[error("remote call timed out")]
    Timeout,

    /// The store answered but declined the operation.
    #[error("{operation} was rejected by the remote store")]
    Rejected {
        /// Name of the rejected operation.
        operation: &'static str,
    },

    /// The store answered with something that could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The store is not reachable at all.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),
}

/// Port for the authoritative feed store.
///
/// Every call is a suspension point and may fail. Implementations must
/// behave identically whether they are in-process substitutes or the
/// production service.
pub trait RemoteActor: Send + Sync {
    /// Publishes a post and returns the id assigned by the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn create_post(
        &self,
        content: &str,
        file_url: &str,
    ) -> impl Future<Output = Result<u64, RemoteError>> + Send;

    /// Fetches every post known to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn get_posts(&self) -> impl Future<Output = Result<Vec<Post>, RemoteError>> + Send;

    /// Adds one like to a post. Returns the store's success flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn like_post(&self, id: u64) -> impl Future<Output = Result<bool, RemoteError>> + Send;

    /// Appends a comment to a post. Returns the store's success flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails.
    fn add_comment(
        &self,
        id: u64,
        text: &str,
    ) -> impl Future<Output = Result<bool, RemoteError>> + Send;
}
