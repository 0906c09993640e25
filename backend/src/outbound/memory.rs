//! In-memory adapter implementing every driven port over plain collections.
//!
//! Used by tests and by the server when no database URL is configured. It
//! honours the same predicate, ordering and aggregation semantics as the
//! Diesel adapters, so behaviour is identical apart from durability.

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::domain::UserId;
use crate::domain::engagement::{FollowEdge, RatingRecord, ViewCounter};
use crate::domain::feed::{
    ContentItem, ContentItemId, FeedPredicate, PopularitySignals, RatingSummary, RecencyPosition,
    StatisticsQuery, StatisticsSnapshot, score_item, take_after,
};
use crate::domain::ports::{
    ContentCatalogue, ContentCatalogueError, EngagementRepository, EngagementRepositoryError,
    EngagementStatistics, EngagementStatisticsError, RecentItemsRequest, ScoredItem,
    SearchPageRequest,
};

const POISONED: &str = "in-memory store lock poisoned";

type PairKey = (ContentItemId, UserId);

#[derive(Debug, Default)]
struct State {
    items: HashMap<ContentItemId, ContentItem>,
    views: HashMap<PairKey, ViewCounter>,
    ratings: HashMap<PairKey, RatingRecord>,
    follows: HashSet<FollowEdge>,
}

impl State {
    fn view_count(&self, item_id: &ContentItemId) -> i64 {
        self.views
            .values()
            .filter(|counter| &counter.item_id == item_id)
            .map(|counter| i64::from(counter.seen))
            .sum()
    }

    fn rating_summary(&self, item_id: &ContentItemId) -> RatingSummary {
        self.ratings
            .values()
            .filter(|record| &record.item_id == item_id)
            .fold(RatingSummary::default(), |summary, record| RatingSummary {
                count: summary.count + 1,
                sum: summary.sum + i64::from(record.rating.get()),
            })
    }

    fn follower_count(&self, user_id: &UserId) -> i64 {
        let count = self
            .follows
            .iter()
            .filter(|edge| &edge.followed_id() == user_id)
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }

    fn is_following(&self, follower_id: &UserId, followed_id: &UserId) -> bool {
        self.follows.iter().any(|edge| {
            &edge.follower_id() == follower_id && &edge.followed_id() == followed_id
        })
    }
}

/// Thread-safe in-memory feed store.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use feed_backend::domain::UserId;
/// use feed_backend::domain::feed::{ContentItem, ContentItemId, ProcessingStatus, Visibility};
/// use feed_backend::outbound::memory::InMemoryFeedStore;
///
/// let store = InMemoryFeedStore::default();
/// let now = Utc::now();
/// store
///     .upsert_item(ContentItem {
///         id: ContentItemId::random(),
///         owner_id: UserId::random(),
///         visibility: Visibility::Public,
///         status: ProcessingStatus::Completed,
///         category_id: None,
///         title: Some("First upload".to_owned()),
///         description: None,
///         created_at: now,
///         updated_at: now,
///     })
///     .expect("store accepts item");
/// assert_eq!(store.len().expect("readable"), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryFeedStore {
    state: RwLock<State>,
}

impl InMemoryFeedStore {
    fn read(&self) -> Result<RwLockReadGuard<'_, State>, String> {
        self.state.read().map_err(|_| POISONED.to_owned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, String> {
        self.state.write().map_err(|_| POISONED.to_owned())
    }

    /// Insert or replace a content item.
    pub fn upsert_item(&self, item: ContentItem) -> Result<(), ContentCatalogueError> {
        let mut state = self.write().map_err(ContentCatalogueError::query)?;
        state.items.insert(item.id, item);
        Ok(())
    }

    /// Number of stored items, eligible or not.
    pub fn len(&self) -> Result<usize, ContentCatalogueError> {
        let state = self.read().map_err(ContentCatalogueError::query)?;
        Ok(state.items.len())
    }

    /// Whether the store holds no items.
    pub fn is_empty(&self) -> Result<bool, ContentCatalogueError> {
        self.len().map(|len| len == 0)
    }
}

#[async_trait]
impl ContentCatalogue for InMemoryFeedStore {
    async fn fetch_recent(
        &self,
        request: &RecentItemsRequest,
    ) -> Result<Vec<ContentItem>, ContentCatalogueError> {
        let state = self.read().map_err(ContentCatalogueError::query)?;
        let rows = state
            .items
            .values()
            .filter(|item| FeedPredicate::all_match(&request.predicates, item))
            .map(|item| (RecencyPosition::of(item), item.clone()))
            .collect();
        Ok(take_after(rows, request.after.as_ref(), request.limit))
    }

    async fn search_page(
        &self,
        request: &SearchPageRequest,
    ) -> Result<Vec<ScoredItem>, ContentCatalogueError> {
        let state = self.read().map_err(ContentCatalogueError::query)?;
        let scored = state
            .items
            .values()
            .filter(|item| FeedPredicate::all_match(&request.predicates, item))
            .filter_map(|item| {
                let signals =
                    PopularitySignals::new(state.view_count(&item.id), state.rating_summary(&item.id));
                score_item(&request.query, item, signals).map(|score| ScoredItem {
                    item: item.clone(),
                    score,
                })
            })
            .collect();
        Ok(request.select(scored))
    }

    async fn find_item(
        &self,
        item_id: &ContentItemId,
    ) -> Result<Option<ContentItem>, ContentCatalogueError> {
        let state = self.read().map_err(ContentCatalogueError::query)?;
        Ok(state.items.get(item_id).cloned())
    }
}

#[async_trait]
impl EngagementStatistics for InMemoryFeedStore {
    async fn snapshot(
        &self,
        query: &StatisticsQuery,
    ) -> Result<StatisticsSnapshot, EngagementStatisticsError> {
        let state = self.read().map_err(EngagementStatisticsError::query)?;
        let mut snapshot = StatisticsSnapshot::default();
        for item_id in &query.item_ids {
            snapshot
                .view_counts
                .insert(*item_id, state.view_count(item_id));
            snapshot
                .ratings
                .insert(*item_id, state.rating_summary(item_id));
        }
        for owner_id in &query.owner_ids {
            snapshot
                .follower_counts
                .insert(*owner_id, state.follower_count(owner_id));
        }
        if let Some(viewer_id) = &query.viewer_id {
            snapshot.followed_owners = query
                .owner_ids
                .iter()
                .filter(|owner_id| state.is_following(viewer_id, owner_id))
                .copied()
                .collect();
            snapshot.viewer_ratings = query
                .item_ids
                .iter()
                .filter_map(|item_id| {
                    state
                        .ratings
                        .get(&(*item_id, *viewer_id))
                        .map(|record| (*item_id, record.rating))
                })
                .collect();
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl EngagementRepository for InMemoryFeedStore {
    async fn find_view_counter(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<ViewCounter>, EngagementRepositoryError> {
        let state = self.read().map_err(EngagementRepositoryError::query)?;
        Ok(state.views.get(&(*item_id, *viewer_id)).copied())
    }

    async fn save_view_counter(
        &self,
        counter: &ViewCounter,
    ) -> Result<(), EngagementRepositoryError> {
        let mut state = self.write().map_err(EngagementRepositoryError::query)?;
        state
            .views
            .insert((counter.item_id, counter.viewer_id), *counter);
        Ok(())
    }

    async fn find_rating(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<RatingRecord>, EngagementRepositoryError> {
        let state = self.read().map_err(EngagementRepositoryError::query)?;
        Ok(state.ratings.get(&(*item_id, *viewer_id)).copied())
    }

    async fn save_rating(&self, record: &RatingRecord) -> Result<(), EngagementRepositoryError> {
        let mut state = self.write().map_err(EngagementRepositoryError::query)?;
        state
            .ratings
            .insert((record.item_id, record.viewer_id), *record);
        Ok(())
    }

    async fn insert_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        let mut state = self.write().map_err(EngagementRepositoryError::query)?;
        Ok(state.follows.insert(*edge))
    }

    async fn delete_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        let mut state = self.write().map_err(EngagementRepositoryError::query)?;
        Ok(state.follows.remove(edge))
    }
}

#[cfg(test)]
mod tests {
    //! Aggregation and ordering behaviour of the in-memory store.

    use super::*;
    use crate::domain::engagement::Rating;
    use crate::domain::feed::{ProcessingStatus, RelevancePosition, SearchQuery, Visibility};
    use crate::domain::ports::SearchOrder;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use rstest::{fixture, rstest};

    #[fixture]
    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .expect("valid fixture time")
    }

    fn item(owner_id: UserId, updated_at: DateTime<Utc>) -> ContentItem {
        ContentItem {
            id: ContentItemId::random(),
            owner_id,
            visibility: Visibility::Public,
            status: ProcessingStatus::Completed,
            category_id: None,
            title: None,
            description: None,
            created_at: updated_at,
            updated_at,
        }
    }

    fn rating(
        item_id: ContentItemId,
        viewer_id: UserId,
        value: i64,
        at: DateTime<Utc>,
    ) -> RatingRecord {
        RatingRecord {
            item_id,
            viewer_id,
            rating: Rating::new(value).expect("fixture rating"),
            updated_at: at,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn recent_items_resume_strictly_after_cursor(base: DateTime<Utc>) {
        let store = InMemoryFeedStore::default();
        let owner = UserId::random();
        let items: Vec<ContentItem> = (0..4)
            .map(|n| item(owner, base + Duration::hours(n)))
            .collect();
        for entry in &items {
            store.upsert_item(entry.clone()).expect("insert");
        }
        let newest = items.last().expect("four items");

        let rows = store
            .fetch_recent(&RecentItemsRequest {
                predicates: vec![FeedPredicate::PublicVisibility],
                after: Some(RecencyPosition::of(newest)),
                limit: 2,
            })
            .await
            .expect("rows");

        let expected: Vec<ContentItemId> =
            items.iter().rev().skip(1).take(2).map(|i| i.id).collect();
        let actual: Vec<ContentItemId> = rows.iter().map(|i| i.id).collect();
        assert_eq!(actual, expected);
    }

    #[rstest]
    #[tokio::test]
    async fn snapshot_aggregates_views_ratings_and_follows(base: DateTime<Utc>) {
        let store = InMemoryFeedStore::default();
        let owner = UserId::random();
        let viewer = UserId::random();
        let other = UserId::random();
        let rated = item(owner, base);
        store.upsert_item(rated.clone()).expect("insert");

        store
            .save_view_counter(&ViewCounter {
                item_id: rated.id,
                viewer_id: viewer,
                seen: 2,
                updated_at: base,
            })
            .await
            .expect("view");
        store
            .save_view_counter(&ViewCounter::first(rated.id, other, base))
            .await
            .expect("view");
        store
            .save_rating(&rating(rated.id, viewer, 3, base))
            .await
            .expect("rating");
        store
            .save_rating(&rating(rated.id, other, 5, base))
            .await
            .expect("rating");
        let edge = FollowEdge::new(viewer, owner).expect("edge");
        assert!(store.insert_follow(&edge).await.expect("follow"));
        assert!(!store.insert_follow(&edge).await.expect("repeat follow"));

        let snapshot = store
            .snapshot(&StatisticsQuery::for_items(
                std::slice::from_ref(&rated),
                Some(viewer),
            ))
            .await
            .expect("snapshot");
        let stats = snapshot.statistics_for(&rated, Some(&viewer));

        assert_eq!(stats.view_count, 3);
        assert_eq!(stats.rating_count, 2);
        assert_eq!(stats.average_rating, 4.0);
        assert_eq!(stats.owner_follower_count, 1);
        assert_eq!(stats.viewer_is_following_owner, Some(true));
        assert_eq!(stats.viewer_rating.map(Rating::get), Some(3));
    }

    #[rstest]
    #[tokio::test]
    async fn ratings_upsert_per_viewer(base: DateTime<Utc>) {
        let store = InMemoryFeedStore::default();
        let entry = item(UserId::random(), base);
        let viewer = UserId::random();
        store.upsert_item(entry.clone()).expect("insert");
        store
            .save_rating(&rating(entry.id, viewer, 1, base))
            .await
            .expect("first");
        store
            .save_rating(&rating(entry.id, viewer, 4, base + Duration::minutes(2)))
            .await
            .expect("second");

        let snapshot = store
            .snapshot(&StatisticsQuery::for_items(std::slice::from_ref(&entry), None))
            .await
            .expect("snapshot");
        assert_eq!(
            snapshot.ratings.get(&entry.id),
            Some(&RatingSummary { count: 1, sum: 4 })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn search_page_scores_with_engagement_and_resumes(base: DateTime<Utc>) {
        let store = InMemoryFeedStore::default();
        let owner = UserId::random();
        let titled = |title: &str, hours: i64| ContentItem {
            title: Some(title.to_owned()),
            ..item(owner, base + Duration::hours(hours))
        };
        let popular = titled("cats", 0);
        let plain = titled("cats", 1);
        let unrelated = titled("dogs", 2);
        for entry in [&popular, &plain, &unrelated] {
            store.upsert_item(entry.clone()).expect("insert");
        }
        store
            .save_view_counter(&ViewCounter {
                item_id: popular.id,
                viewer_id: UserId::random(),
                seen: 1500,
                updated_at: base,
            })
            .await
            .expect("views");
        store
            .save_rating(&rating(popular.id, UserId::random(), 4, base))
            .await
            .expect("rating");

        let mut request = SearchPageRequest {
            predicates: vec![FeedPredicate::PublicVisibility],
            query: SearchQuery::parse("cats").expect("query"),
            order: SearchOrder::Relevance { after: None },
            limit: 1,
        };
        let first = store.search_page(&request).await.expect("first page");
        let top = first.first().expect("one hit");
        assert_eq!(top.item.id, popular.id);
        assert_eq!(top.score.value(), 13.0 + 1.5 + 4.0);

        request.order = SearchOrder::Relevance {
            after: Some(RelevancePosition::new(top.score, top.item.id)),
        };
        request.limit = 5;
        let rest = store.search_page(&request).await.expect("second page");
        let ids: Vec<ContentItemId> = rest.iter().map(|row| row.item.id).collect();
        assert_eq!(ids, vec![plain.id]);
    }

    #[rstest]
    #[tokio::test]
    async fn unfollow_reports_missing_edges() {
        let store = InMemoryFeedStore::default();
        let edge = FollowEdge::new(UserId::random(), UserId::random()).expect("edge");
        assert!(!store.delete_follow(&edge).await.expect("delete"));
        store.insert_follow(&edge).await.expect("insert");
        assert!(store.delete_follow(&edge).await.expect("delete"));
    }
}
