//! PostgreSQL-backed `EngagementRepository` implementation using Diesel ORM.
//!
//! Counter and rating saves are `INSERT .. ON CONFLICT DO UPDATE` keyed by the
//! (item, viewer) primary key. Follow inserts use `ON CONFLICT DO NOTHING`
//! and report whether a row was written.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::engagement::{FollowEdge, Rating, RatingRecord, ViewCounter};
use crate::domain::feed::ContentItemId;
use crate::domain::ports::{EngagementRepository, EngagementRepositoryError};

use super::diesel_helpers::{map_diesel_error, map_pool_error};
use super::models::{NewFollowEdgeRow, RatingRow, ViewCounterRow};
use super::pool::{DbPool, PoolError};
use super::schema::{follow_edges, ratings, view_counters};

/// Diesel-backed implementation of the `EngagementRepository` port.
#[derive(Clone)]
pub struct DieselEngagementRepository {
    pool: DbPool,
}

impl DieselEngagementRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> EngagementRepositoryError {
    map_pool_error(error, EngagementRepositoryError::connection)
}

fn diesel_error(error: diesel::result::Error) -> EngagementRepositoryError {
    map_diesel_error(
        error,
        EngagementRepositoryError::query,
        EngagementRepositoryError::connection,
    )
}

fn row_to_counter(row: ViewCounterRow) -> ViewCounter {
    ViewCounter {
        item_id: ContentItemId::from_uuid(row.item_id),
        viewer_id: UserId::from_uuid(row.viewer_id),
        seen: row.seen,
        updated_at: row.updated_at,
    }
}

fn counter_to_row(counter: &ViewCounter) -> ViewCounterRow {
    ViewCounterRow {
        item_id: *counter.item_id.as_uuid(),
        viewer_id: *counter.viewer_id.as_uuid(),
        seen: counter.seen,
        updated_at: counter.updated_at,
    }
}

fn row_to_rating(row: RatingRow) -> Result<RatingRecord, EngagementRepositoryError> {
    let rating = Rating::new(i64::from(row.rating))
        .map_err(|err| EngagementRepositoryError::query(err.to_string()))?;
    Ok(RatingRecord {
        item_id: ContentItemId::from_uuid(row.item_id),
        viewer_id: UserId::from_uuid(row.viewer_id),
        rating,
        updated_at: row.updated_at,
    })
}

fn rating_to_row(record: &RatingRecord) -> RatingRow {
    RatingRow {
        item_id: *record.item_id.as_uuid(),
        viewer_id: *record.viewer_id.as_uuid(),
        rating: i16::from(record.rating.get()),
        updated_at: record.updated_at,
    }
}

fn edge_to_row(edge: &FollowEdge) -> NewFollowEdgeRow {
    NewFollowEdgeRow {
        follower_id: *edge.follower_id().as_uuid(),
        followed_id: *edge.followed_id().as_uuid(),
    }
}

#[async_trait]
impl EngagementRepository for DieselEngagementRepository {
    async fn find_view_counter(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<ViewCounter>, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ViewCounterRow> = view_counters::table
            .find((*item_id.as_uuid(), *viewer_id.as_uuid()))
            .select(ViewCounterRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        Ok(row.map(row_to_counter))
    }

    async fn save_view_counter(
        &self,
        counter: &ViewCounter,
    ) -> Result<(), EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(view_counters::table)
            .values(counter_to_row(counter))
            .on_conflict((view_counters::item_id, view_counters::viewer_id))
            .do_update()
            .set((
                view_counters::seen.eq(excluded(view_counters::seen)),
                view_counters::updated_at.eq(excluded(view_counters::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_rating(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<RatingRecord>, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<RatingRow> = ratings::table
            .find((*item_id.as_uuid(), *viewer_id.as_uuid()))
            .select(RatingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_rating).transpose()
    }

    async fn save_rating(&self, record: &RatingRecord) -> Result<(), EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        diesel::insert_into(ratings::table)
            .values(rating_to_row(record))
            .on_conflict((ratings::item_id, ratings::viewer_id))
            .do_update()
            .set((
                ratings::rating.eq(excluded(ratings::rating)),
                ratings::updated_at.eq(excluded(ratings::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn insert_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let inserted = diesel::insert_into(follow_edges::table)
            .values(edge_to_row(edge))
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;

        Ok(inserted > 0)
    }

    async fn delete_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let deleted = diesel::delete(
            follow_edges::table
                .filter(follow_edges::follower_id.eq(*edge.follower_id().as_uuid()))
                .filter(follow_edges::followed_id.eq(*edge.followed_id().as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;

        Ok(deleted > 0)
    }
}
