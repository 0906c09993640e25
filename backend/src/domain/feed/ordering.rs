//! Total orders over feed items and the matching resume predicate.
//!
//! Every feed is ordered by a primary key descending with the item identifier
//! descending as tie-break. [`FeedPosition::feed_cmp`] and
//! [`FeedPosition::is_after`] encode the same rule; storage adapters compile
//! the predicate into `WHERE key < $k OR (key = $k AND id < $id)` next to
//! `ORDER BY key DESC, id DESC`.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::content::{ContentItem, ContentItemId};
use super::relevance::RelevanceScore;

/// An item's place in a feed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedPosition<K> {
    /// Primary sort key.
    pub key: K,
    /// Tie-break.
    pub id: ContentItemId,
}

/// Position in the recency order.
pub type RecencyPosition = FeedPosition<DateTime<Utc>>;
/// Position in the relevance order.
pub type RelevancePosition = FeedPosition<RelevanceScore>;

impl<K: Ord> FeedPosition<K> {
    /// Construct a position.
    pub const fn new(key: K, id: ContentItemId) -> Self {
        Self { key, id }
    }

    /// Compare two positions in feed order; `Less` means `self` is served
    /// first.
    ///
    /// # Examples
    /// ```
    /// use feed_backend::domain::feed::{ContentItemId, FeedPosition};
    /// use std::cmp::Ordering;
    ///
    /// let id = ContentItemId::random();
    /// let newer = FeedPosition::new(2_i64, id);
    /// let older = FeedPosition::new(1_i64, id);
    /// assert_eq!(newer.feed_cmp(&older), Ordering::Less);
    /// ```
    pub fn feed_cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.id.cmp(&self.id))
    }

    /// Whether `self` lies strictly after `cursor` in feed order.
    ///
    /// Holds exactly when `self.feed_cmp(cursor)` is `Greater`.
    pub fn is_after(&self, cursor: &Self) -> bool {
        self.key < cursor.key || (self.key == cursor.key && self.id < cursor.id)
    }
}

/// Sort `rows` into feed order, drop everything at or before `after`, and keep
/// at most `limit` rows.
///
/// In-process adapters use this as the reference for what a storage query with
/// `ORDER BY key DESC, id DESC` and the resume predicate returns.
pub fn take_after<K, T>(
    mut rows: Vec<(FeedPosition<K>, T)>,
    after: Option<&FeedPosition<K>>,
    limit: usize,
) -> Vec<T>
where
    K: Ord,
{
    rows.sort_by(|(a, _), (b, _)| a.feed_cmp(b));
    rows.into_iter()
        .filter(|(position, _)| after.is_none_or(|cursor| position.is_after(cursor)))
        .take(limit)
        .map(|(_, row)| row)
        .collect()
}

impl RecencyPosition {
    /// The recency position of `item`.
    pub fn of(item: &ContentItem) -> Self {
        Self::new(item.updated_at, item.id)
    }
}
