//! Identity provider implementations.

mod local_identity;

pub use local_identity::LocalIdentityProvider;
