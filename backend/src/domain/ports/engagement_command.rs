//! Driving port for engagement writes.

use async_trait::async_trait;

use crate::domain::engagement::{FollowOutcome, Rating, RatingOutcome, ViewOutcome};
use crate::domain::feed::ContentItemId;
use crate::domain::{Error, UserId};

/// Domain use-case port for views, ratings and follows.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EngagementCommand: Send + Sync {
    /// Count a view unless the viewer's previous view is inside the cool-down.
    async fn record_view(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<ViewOutcome, Error>;

    /// Store a rating unless the viewer's previous change is inside the
    /// cool-down, in which case the prior rating is returned unchanged.
    async fn rate_item(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
        rating: Rating,
    ) -> Result<RatingOutcome, Error>;

    /// Follow `followed_id`; idempotent.
    async fn follow(
        &self,
        follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error>;

    /// Stop following `followed_id`; idempotent.
    async fn unfollow(
        &self,
        follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error>;
}

/// Fixture command that accepts every write without storing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureEngagementCommand;

#[async_trait]
impl EngagementCommand for FixtureEngagementCommand {
    async fn record_view(
        &self,
        item_id: &ContentItemId,
        _viewer_id: &UserId,
    ) -> Result<ViewOutcome, Error> {
        Ok(ViewOutcome {
            item_id: *item_id,
            seen: 1,
            recorded: true,
        })
    }

    async fn rate_item(
        &self,
        item_id: &ContentItemId,
        _viewer_id: &UserId,
        rating: Rating,
    ) -> Result<RatingOutcome, Error> {
        Ok(RatingOutcome {
            item_id: *item_id,
            rating,
            recorded: true,
        })
    }

    async fn follow(
        &self,
        _follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error> {
        Ok(FollowOutcome {
            followed_id: *followed_id,
            following: true,
            changed: true,
        })
    }

    async fn unfollow(
        &self,
        _follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error> {
        Ok(FollowOutcome {
            followed_id: *followed_id,
            following: false,
            changed: true,
        })
    }
}
