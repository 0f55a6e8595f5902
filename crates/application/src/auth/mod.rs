//! Authentication module for the Civitas feed client.
//!
//! This module provides:
//! - The session state machine gating every feed operation
//! - Startup restoration of a provider-held session

mod session;

pub use session::{AuthSession, AuthState};
