//! Remote store client using reqwest.
//!
//! Talks JSON to the feed service:
//! - `POST {base}/posts` with `{content, fileUrl}` answers `{id}`
//! - `GET {base}/posts` answers a list of posts
//! - `POST {base}/posts/{id}/likes` answers `{ok}`
//! - `POST {base}/posts/{id}/comments` with `{text}` answers `{ok}`
//!
//! Timestamps on the wire are milliseconds since the Unix epoch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use civitas_application::{RemoteActor, RemoteError};
use civitas_domain::{Comment, Post, Principal};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default timeout applied to every call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreatePostBody<'a> {
    content: &'a str,
    file_url: &'a str,
}

#[derive(Debug, Serialize)]
struct CommentBody<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreatedPost {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct Ack {
    ok: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentDto {
    id: u64,
    text: String,
    author: String,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostDto {
    id: u64,
    content: String,
    #[serde(default)]
    file_url: String,
    #[serde(default)]
    likes: u64,
    #[serde(default)]
    comments: Vec<CommentDto>,
    author: String,
    timestamp: i64,
}

fn parse_timestamp(millis: i64) -> Result<DateTime<Utc>, RemoteError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| RemoteError::InvalidResponse(format!("timestamp out of range: {millis}")))
}

fn parse_principal(raw: String) -> Result<Principal, RemoteError> {
    Principal::new(raw).map_err(|e| RemoteError::InvalidResponse(e.to_string()))
}

impl TryFrom<CommentDto> for Comment {
    type Error = RemoteError;

    fn try_from(dto: CommentDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: dto.id,
            text: dto.text,
            author: parse_principal(dto.author)?,
            created_at: parse_timestamp(dto.timestamp)?,
        })
    }
}

impl TryFrom<PostDto> for Post {
    type Error = RemoteError;

    fn try_from(dto: PostDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: dto.id,
            content: dto.content,
            file_url: dto.file_url,
            like_count: dto.likes,
            comments: dto
                .comments
                .into_iter()
                .map(Comment::try_from)
                .collect::<Result<_, _>>()?,
            author: parse_principal(dto.author)?,
            created_at: parse_timestamp(dto.timestamp)?,
        })
    }
}

/// Remote store reached over HTTP.
pub struct HttpRemoteActor {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpRemoteActor {
    /// Creates a client for the service rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(base_url: Url) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(concat!("Civitas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, base_url))
    }

    /// Creates a client with a custom reqwest client.
    #[must_use]
    pub fn with_client(client: Client, mut base_url: Url) -> Self {
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            client,
            base_url,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteError> {
        self.base_url
            .join(path)
            .map_err(|e| RemoteError::Transport(format!("bad endpoint {path}: {e}")))
    }

    /// Maps reqwest errors to `RemoteError`.
    fn map_error(error: &reqwest::Error) -> RemoteError {
        if error.is_timeout() {
            return RemoteError::Timeout;
        }
        if error.is_connect() {
            return RemoteError::Unavailable(error.to_string());
        }
        if error.is_decode() {
            return RemoteError::InvalidResponse(error.to_string());
        }
        RemoteError::Transport(error.to_string())
    }

    fn status_error(status: StatusCode) -> RemoteError {
        if status == StatusCode::SERVICE_UNAVAILABLE {
            RemoteError::Unavailable(status.to_string())
        } else {
            RemoteError::Transport(format!("HTTP {status}"))
        }
    }

    /// Posts to an acknowledgement endpoint. A 404 means the store does
    /// not know the post and is reported as a `false` flag.
    async fn acknowledge<B: Serialize + Sync>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<bool, RemoteError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => {
                let ack: Ack = response.json().await.map_err(|e| Self::map_error(&e))?;
                Ok(ack.ok)
            }
            status => Err(Self::status_error(status)),
        }
    }
}

impl RemoteActor for HttpRemoteActor {
    async fn create_post(&self, content: &str, file_url: &str) -> Result<u64, RemoteError> {
        let url = self.endpoint("posts")?;
        debug!(%url, "createPost");

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&CreatePostBody { content, file_url })
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        let created: CreatedPost = response.json().await.map_err(|e| Self::map_error(&e))?;
        Ok(created.id)
    }

    async fn get_posts(&self) -> Result<Vec<Post>, RemoteError> {
        let url = self.endpoint("posts")?;
        debug!(%url, "getPosts");

        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| Self::map_error(&e))?;

        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        let posts: Vec<PostDto> = response.json().await.map_err(|e| Self::map_error(&e))?;
        posts.into_iter().map(Post::try_from).collect()
    }

    async fn like_post(&self, id: u64) -> Result<bool, RemoteError> {
        let url = self.endpoint(&format!("posts/{id}/likes"))?;
        debug!(%url, "likePost");
        self.acknowledge(url, &serde_json::json!({})).await
    }

    async fn add_comment(&self, id: u64, text: &str) -> Result<bool, RemoteError> {
        let url = self.endpoint(&format!("posts/{id}/comments"))?;
        debug!(%url, "addComment");
        self.acknowledge(url, &CommentBody { text }).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn actor(base: &str) -> HttpRemoteActor {
        HttpRemoteActor::with_client(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn test_endpoints_keep_base_path() {
        let actor = actor("https://feed.example.com/api/v1");
        assert_eq!(
            actor.endpoint("posts").unwrap().as_str(),
            "https://feed.example.com/api/v1/posts"
        );
        assert_eq!(
            actor.endpoint("posts/7/likes").unwrap().as_str(),
            "https://feed.example.com/api/v1/posts/7/likes"
        );
    }

    #[test]
    fn test_endpoints_at_root() {
        let actor = actor("http://localhost:8000");
        assert_eq!(
            actor.endpoint("posts").unwrap().as_str(),
            "http://localhost:8000/posts"
        );
    }

    #[test]
    fn test_post_dto_conversion() {
        let json = r#"{
            "id": 3,
            "content": "hello",
            "fileUrl": "https://example.com/cat.png",
            "likes": 5,
            "comments": [
                {"id": 1, "text": "nice", "author": "bob", "timestamp": 1700000001000}
            ],
            "author": "alice",
            "timestamp": 1700000000000
        }"#;
        let dto: PostDto = serde_json::from_str(json).unwrap();
        let post = Post::try_from(dto).unwrap();

        assert_eq!(post.id, 3);
        assert_eq!(post.like_count, 5);
        assert_eq!(post.file_url, "https://example.com/cat.png");
        assert_eq!(post.author.as_str(), "alice");
        assert_eq!(post.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(post.comments.len(), 1);
        assert_eq!(post.comments[0].author.as_str(), "bob");
    }

    #[test]
    fn test_post_dto_defaults() {
        let json = r#"{"id": 1, "content": "hi", "author": "alice", "timestamp": 0}"#;
        let dto: PostDto = serde_json::from_str(json).unwrap();
        let post = Post::try_from(dto).unwrap();

        assert_eq!(post.file_url, "");
        assert_eq!(post.like_count, 0);
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_post_dto_with_empty_author_is_invalid() {
        let json = r#"{"id": 1, "content": "hi", "author": "", "timestamp": 0}"#;
        let dto: PostDto = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Post::try_from(dto),
            Err(RemoteError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_create_body_uses_camel_case() {
        let body = CreatePostBody {
            content: "hi",
            file_url: "",
        };
        let json = serde_json::to_string(&body).unwrap();
        assert_eq!(json, r#"{"content":"hi","fileUrl":""}"#);
    }

    #[test]
    fn test_status_errors() {
        assert!(matches!(
            HttpRemoteActor::status_error(StatusCode::SERVICE_UNAVAILABLE),
            RemoteError::Unavailable(_)
        ));
        assert!(matches!(
            HttpRemoteActor::status_error(StatusCode::INTERNAL_SERVER_ERROR),
            RemoteError::Transport(_)
        ));
    }
}
