//! Deterministic JSON serialization for files written by the client.
//!
//! Output uses 2-space indentation and a trailing newline so that
//! hand-edited settings files stay diff-friendly.

mod json;

pub use json::*;
