//! Civitas Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus settings persistence.

pub mod adapters;
pub mod auth;
pub mod persistence;
pub mod serialization;

pub use adapters::{HttpRemoteActor, InMemoryRemoteActor, SystemClock};
pub use auth::LocalIdentityProvider;
pub use persistence::{IDENTITY_PROVIDER_ENV, SettingsError, SettingsRepository, apply_override};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
