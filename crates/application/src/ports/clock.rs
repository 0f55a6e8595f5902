//! Clock port

use chrono::{DateTime, Utc};

/// Port for getting the current time.
///
/// Confirmed posts and comments are stamped with this clock, so tests
/// can pin timestamps with a fixed implementation.
pub trait Clock: Send + Sync {
    /// Returns the current UTC timestamp.
    fn now(&self) -> DateTime<Utc>;
}
