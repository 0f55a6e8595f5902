//! Local feed view and its reconciliation with the remote store.

mod store;

pub use store::{FeedStore, RefreshOutcome};
