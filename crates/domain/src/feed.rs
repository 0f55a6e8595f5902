//! Feed ordering rules.

use std::cmp::Ordering;

use crate::post::Post;

/// Compares two posts by feed order: most recent first, ties broken by
/// the higher id first.
#[must_use]
pub fn feed_order(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Sorts posts into feed order in place.
pub fn sort_feed(posts: &mut [Post]) {
    posts.sort_by(feed_order);
}

/// Returns the index at which `post` belongs in an already sorted feed.
#[must_use]
pub fn insertion_index(posts: &[Post], post: &Post) -> usize {
    posts.partition_point(|existing| feed_order(existing, post) == Ordering::Less)
}
