//! Civitas Domain - Core feed types
//!
//! This crate defines the data model for the Civitas feed client.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod feed;
pub mod id;
pub mod post;
pub mod principal;
pub mod settings;

pub use error::{DomainError, DomainResult};
pub use feed::{feed_order, insertion_index, sort_feed};
pub use id::generate_id;
pub use post::{Comment, NewPost, Post, validate_comment_text};
pub use principal::Principal;
pub use settings::{ClientSettings, DEFAULT_IDENTITY_PROVIDER_URL};
