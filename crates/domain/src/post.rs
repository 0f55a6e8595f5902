//! Posts and comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};
use crate::principal::Principal;

/// A comment attached to a post. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Identifier, unique across the feed.
    pub id: u64,
    /// Comment body (never empty).
    pub text: String,
    /// Who wrote the comment.
    pub author: Principal,
    /// When the comment was created.
    pub created_at: DateTime<Utc>,
}

/// A published post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Identifier assigned by the remote store (monotonic).
    pub id: u64,
    /// Text content.
    pub content: String,
    /// Attached file reference, empty when there is none.
    #[serde(default)]
    pub file_url: String,
    /// Number of likes received.
    #[serde(default)]
    pub like_count: u64,
    /// Comments in insertion order.
    #[serde(default)]
    pub comments: Vec<Comment>,
    /// Who published the post.
    pub author: Principal,
    /// When the post was published.
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Builds a freshly confirmed post with no likes or comments.
    #[must_use]
    pub fn confirmed(id: u64, draft: NewPost, author: Principal, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            content: draft.content,
            file_url: draft.file_url,
            like_count: 0,
            comments: Vec::new(),
            author,
            created_at,
        }
    }

    /// Returns true if a file is attached.
    #[must_use]
    pub const fn has_attachment(&self) -> bool {
        !self.file_url.is_empty()
    }

    /// Largest comment id on this post, if any.
    #[must_use]
    pub fn max_comment_id(&self) -> Option<u64> {
        self.comments.iter().map(|c| c.id).max()
    }
}

/// A validated post draft, ready to be sent to the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    content: String,
    file_url: String,
}

impl NewPost {
    /// Validates a draft.
    ///
    /// `file_url` may be empty; otherwise it must be an absolute
    /// `http` or `https` URL.
    ///
    /// # Errors
    ///
    /// - `DomainError::EmptyContent` when `content` is blank
    /// - `DomainError::InvalidUrl` when `file_url` is malformed
    pub fn new(content: impl Into<String>, file_url: impl Into<String>) -> DomainResult<Self> {
        let content = content.into();
        let file_url = file_url.into().trim().to_string();

        if content.trim().is_empty() {
            return Err(DomainError::EmptyContent);
        }
        if !file_url.is_empty() {
            validate_file_url(&file_url)?;
        }

        Ok(Self { content, file_url })
    }

    /// Post content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Attached file URL, possibly empty.
    #[must_use]
    pub fn file_url(&self) -> &str {
        &self.file_url
    }
}

fn validate_file_url(raw: &str) -> DomainResult<()> {
    let parsed = Url::parse(raw).map_err(|e| DomainError::InvalidUrl(format!("{raw}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        "http" | "https" => Err(DomainError::InvalidUrl(format!("{raw}: missing host"))),
        other => Err(DomainError::InvalidUrl(format!(
            "{raw}: unsupported scheme '{other}'"
        ))),
    }
}

/// Validates comment text.
///
/// # Errors
///
/// Returns `DomainError::EmptyComment` when `text` is blank.
pub fn validate_comment_text(text: &str) -> DomainResult<()> {
    if text.trim().is_empty() {
        return Err(DomainError::EmptyComment);
    }
    Ok(())
}
