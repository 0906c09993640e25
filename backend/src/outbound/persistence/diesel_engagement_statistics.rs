//! PostgreSQL-backed `EngagementStatistics` implementation using Diesel ORM.
//!
//! Each aggregate is a grouped query bound to the page's identifiers; no
//! query scans engagement rows outside the requested items and owners.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::engagement::Rating;
use crate::domain::feed::{ContentItemId, StatisticsQuery, StatisticsSnapshot};
use crate::domain::ports::{EngagementStatistics, EngagementStatisticsError};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::engagement_aggregates::{follower_counts, rating_summaries, view_totals};
use super::pool::{DbPool, PoolError};
use super::schema::{follow_edges, ratings};

/// Diesel-backed implementation of the `EngagementStatistics` port.
#[derive(Clone)]
pub struct DieselEngagementStatistics {
    pool: DbPool,
}

impl DieselEngagementStatistics {
    /// Create a new statistics adapter with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> EngagementStatisticsError {
    map_pool_error(error, EngagementStatisticsError::connection)
}

fn diesel_error(error: diesel::result::Error) -> EngagementStatisticsError {
    map_diesel_error(
        error,
        EngagementStatisticsError::query,
        EngagementStatisticsError::connection,
    )
}

fn stored_rating(value: i16) -> Result<Rating, EngagementStatisticsError> {
    Rating::new(i64::from(value)).map_err(|err| EngagementStatisticsError::query(err.to_string()))
}

#[async_trait]
impl EngagementStatistics for DieselEngagementStatistics {
    async fn snapshot(
        &self,
        query: &StatisticsQuery,
    ) -> Result<StatisticsSnapshot, EngagementStatisticsError> {
        if query.is_empty() {
            return Ok(StatisticsSnapshot::default());
        }
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let item_ids: Vec<Uuid> = query.item_ids.iter().map(|id| *id.as_uuid()).collect();
        let owner_ids: Vec<Uuid> = query.owner_ids.iter().map(|id| *id.as_uuid()).collect();

        let views = view_totals(&mut conn, &item_ids)
            .await
            .map_err(diesel_error)?;
        let summaries = rating_summaries(&mut conn, &item_ids)
            .await
            .map_err(diesel_error)?;
        let followers = follower_counts(&mut conn, &owner_ids)
            .await
            .map_err(diesel_error)?;

        let mut snapshot = StatisticsSnapshot {
            view_counts: views
                .into_iter()
                .map(|(id, total)| (ContentItemId::from_uuid(id), total))
                .collect(),
            ratings: summaries
                .into_iter()
                .map(|(id, summary)| (ContentItemId::from_uuid(id), summary))
                .collect(),
            follower_counts: followers
                .into_iter()
                .map(|(id, total)| (UserId::from_uuid(id), total))
                .collect(),
            ..StatisticsSnapshot::default()
        };

        let Some(viewer_id) = query.viewer_id else {
            return Ok(snapshot);
        };
        let viewer = *viewer_id.as_uuid();

        let followed: Vec<Uuid> = follow_edges::table
            .filter(follow_edges::follower_id.eq(viewer))
            .filter(follow_edges::followed_id.eq_any(&owner_ids))
            .select(follow_edges::followed_id)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        snapshot.followed_owners = followed.into_iter().map(UserId::from_uuid).collect();

        let own_ratings: Vec<(Uuid, i16)> = ratings::table
            .filter(ratings::viewer_id.eq(viewer))
            .filter(ratings::item_id.eq_any(&item_ids))
            .select((ratings::item_id, ratings::rating))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        snapshot.viewer_ratings = own_ratings
            .into_iter()
            .map(|(id, value)| Ok((ContentItemId::from_uuid(id), stored_rating(value)?)))
            .collect::<Result<_, EngagementStatisticsError>>()?;

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(5)]
    fn stored_ratings_in_range_convert(#[case] value: i16) {
        let rating = stored_rating(value).expect("valid rating");
        assert_eq!(i16::from(rating.get()), value);
    }

    #[rstest]
    fn corrupt_stored_rating_is_a_query_error() {
        let err = stored_rating(9).expect_err("out of range");
        assert!(matches!(err, EngagementStatisticsError::Query { .. }));
    }
}
