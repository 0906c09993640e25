//! Driven port persisting views, ratings and follow edges.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::UserId;
use crate::domain::engagement::{FollowEdge, RatingRecord, ViewCounter};
use crate::domain::feed::ContentItemId;

define_port_error! {
    /// Errors raised while reading or writing engagement rows.
    pub enum EngagementRepositoryError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "engagement repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "engagement repository query failed: {message}",
    }
}

/// Port for point reads and writes of engagement rows.
///
/// Saves are upserts keyed by `(item, viewer)`, so at most one counter and
/// one rating exist per pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementRepository: Send + Sync {
    /// Current view counter for the pair, if any.
    async fn find_view_counter(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<ViewCounter>, EngagementRepositoryError>;

    /// Insert or replace the pair's view counter.
    async fn save_view_counter(
        &self,
        counter: &ViewCounter,
    ) -> Result<(), EngagementRepositoryError>;

    /// Current rating for the pair, if any.
    async fn find_rating(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<Option<RatingRecord>, EngagementRepositoryError>;

    /// Insert or replace the pair's rating.
    async fn save_rating(&self, record: &RatingRecord) -> Result<(), EngagementRepositoryError>;

    /// Insert `edge`; returns `false` when it already existed.
    async fn insert_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError>;

    /// Delete `edge`; returns `false` when it did not exist.
    async fn delete_follow(&self, edge: &FollowEdge) -> Result<bool, EngagementRepositoryError>;
}

/// Fixture repository that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEngagementRepository;

#[async_trait]
impl EngagementRepository for FixtureEngagementRepository {
    async fn find_view_counter(
        &self,
        _item_id: &ContentItemId,
        _viewer_id: &UserId,
    ) -> Result<Option<ViewCounter>, EngagementRepositoryError> {
        Ok(None)
    }

    async fn save_view_counter(
        &self,
        _counter: &ViewCounter,
    ) -> Result<(), EngagementRepositoryError> {
        Ok(())
    }

    async fn find_rating(
        &self,
        _item_id: &ContentItemId,
        _viewer_id: &UserId,
    ) -> Result<Option<RatingRecord>, EngagementRepositoryError> {
        Ok(None)
    }

    async fn save_rating(&self, _record: &RatingRecord) -> Result<(), EngagementRepositoryError> {
        Ok(())
    }

    async fn insert_follow(&self, _edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        Ok(true)
    }

    async fn delete_follow(&self, _edge: &FollowEdge) -> Result<bool, EngagementRepositoryError> {
        Ok(false)
    }
}
