//! Per-item statistics joined onto feed pages.
//!
//! Statistics are resolved in one grouped lookup per page: the resolver
//! collects the page's item and owner identifiers, asks the
//! [`EngagementStatistics`] port for a [`StatisticsSnapshot`] restricted to
//! them, then joins the snapshot back onto each item by identifier.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::content::{ContentItem, ContentItemId};
use crate::domain::UserId;
use crate::domain::engagement::Rating;
use crate::domain::ports::{EngagementStatistics, EngagementStatisticsError};

/// Count and total of the ratings left on one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RatingSummary {
    /// Number of ratings.
    pub count: i64,
    /// Sum of all rating values.
    pub sum: i64,
}

impl RatingSummary {
    /// Arithmetic mean; `0.0` when there are no ratings.
    ///
    /// # Examples
    /// ```
    /// use feed_backend::domain::feed::RatingSummary;
    ///
    /// assert_eq!(RatingSummary { count: 2, sum: 8 }.average(), 4.0);
    /// assert_eq!(RatingSummary::default().average(), 0.0);
    /// ```
    pub fn average(self) -> f64 {
        if self.count <= 0 {
            return 0.0;
        }
        self.sum as f64 / self.count as f64
    }
}

/// Derived statistics for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStatistics {
    /// Sum of `seen` across every viewer.
    pub view_count: i64,
    /// Number of ratings.
    pub rating_count: i64,
    /// Mean rating, `0.0` when unrated.
    pub average_rating: f64,
    /// Followers of the item's owner.
    pub owner_follower_count: i64,
    /// Whether the viewer follows the owner; `None` for anonymous viewers.
    pub viewer_is_following_owner: Option<bool>,
    /// The viewer's own rating, if any.
    pub viewer_rating: Option<Rating>,
}

/// Identifiers whose statistics a page needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatisticsQuery {
    /// Items on the page.
    pub item_ids: Vec<ContentItemId>,
    /// Distinct owners of those items.
    pub owner_ids: Vec<UserId>,
    /// Viewer for personalised fields.
    pub viewer_id: Option<UserId>,
}

impl StatisticsQuery {
    /// Collect identifiers from `items`, de-duplicating owners.
    pub fn for_items(items: &[ContentItem], viewer_id: Option<UserId>) -> Self {
        let mut seen_owners = HashSet::new();
        let owner_ids = items
            .iter()
            .map(|item| item.owner_id)
            .filter(|owner| seen_owners.insert(*owner))
            .collect();
        Self {
            item_ids: items.iter().map(|item| item.id).collect(),
            owner_ids,
            viewer_id,
        }
    }

    /// Whether there is nothing to look up.
    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }
}

/// Grouped aggregates for a set of items, keyed by identifier.
///
/// Missing keys mean "no rows", which reads as zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsSnapshot {
    /// `SUM(seen)` per item.
    pub view_counts: HashMap<ContentItemId, i64>,
    /// Rating count and sum per item.
    pub ratings: HashMap<ContentItemId, RatingSummary>,
    /// Follower count per owner.
    pub follower_counts: HashMap<UserId, i64>,
    /// Owners the viewer follows.
    pub followed_owners: HashSet<UserId>,
    /// The viewer's ratings.
    pub viewer_ratings: HashMap<ContentItemId, Rating>,
}

impl StatisticsSnapshot {
    /// View count for `item_id`.
    pub fn view_count(&self, item_id: &ContentItemId) -> i64 {
        self.view_counts.get(item_id).copied().unwrap_or_default()
    }

    /// Rating summary for `item_id`.
    pub fn rating_summary(&self, item_id: &ContentItemId) -> RatingSummary {
        self.ratings.get(item_id).copied().unwrap_or_default()
    }

    /// Join the snapshot onto `item`.
    pub fn statistics_for(&self, item: &ContentItem, viewer_id: Option<&UserId>) -> ItemStatistics {
        let ratings = self.rating_summary(&item.id);
        ItemStatistics {
            view_count: self.view_count(&item.id),
            rating_count: ratings.count,
            average_rating: ratings.average(),
            owner_follower_count: self
                .follower_counts
                .get(&item.owner_id)
                .copied()
                .unwrap_or_default(),
            viewer_is_following_owner: viewer_id
                .map(|_| self.followed_owners.contains(&item.owner_id)),
            viewer_rating: viewer_id.and_then(|_| self.viewer_ratings.get(&item.id).copied()),
        }
    }
}

/// Resolves [`ItemStatistics`] for the items of one page.
pub struct AggregateResolver<S: ?Sized> {
    statistics: Arc<S>,
}

impl<S: ?Sized> Clone for AggregateResolver<S> {
    fn clone(&self) -> Self {
        Self {
            statistics: Arc::clone(&self.statistics),
        }
    }
}

impl<S> AggregateResolver<S>
where
    S: EngagementStatistics + ?Sized,
{
    /// Build a resolver over a statistics port.
    pub fn new(statistics: Arc<S>) -> Self {
        Self { statistics }
    }

    /// Resolve statistics for `items`, in the same order.
    ///
    /// Issues no lookup when `items` is empty.
    pub async fn resolve(
        &self,
        items: &[ContentItem],
        viewer_id: Option<&UserId>,
    ) -> Result<Vec<ItemStatistics>, EngagementStatisticsError> {
        let query = StatisticsQuery::for_items(items, viewer_id.copied());
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let snapshot = self.statistics.snapshot(&query).await?;
        Ok(items
            .iter()
            .map(|item| snapshot.statistics_for(item, viewer_id))
            .collect())
    }
}
