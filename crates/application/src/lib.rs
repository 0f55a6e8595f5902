//! Civitas Application - Session-gated feed engine
//!
//! This crate defines the application layer with:
//! - Port traits (remote store, identity provider, clock)
//! - The authentication session and the local feed store
//! - The engine wiring them together
//! - Application-level error handling

pub mod auth;
pub mod engine;
pub mod error;
pub mod feed;
pub mod ports;

pub use auth::{AuthSession, AuthState};
pub use engine::Engine;
pub use error::{ApplicationError, ApplicationResult, ErrorKind};
pub use feed::{FeedStore, RefreshOutcome};
pub use ports::{Clock, IdentityError, IdentityProvider, RemoteActor, RemoteError};
