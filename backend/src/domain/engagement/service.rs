//! Engagement command service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use super::{
    CooldownPolicy, FollowEdge, FollowOutcome, Rating, RatingOutcome, RatingRecord, ViewCounter,
    ViewOutcome,
};
use crate::domain::feed::ContentItemId;
use crate::domain::ports::{
    ContentCatalogue, ContentCatalogueError, EngagementCommand, EngagementRepository,
    EngagementRepositoryError,
};
use crate::domain::{Error, UserId};

/// Engagement service enforcing item visibility and cool-down windows.
pub struct EngagementService<R: ?Sized, C: ?Sized> {
    repository: Arc<R>,
    catalogue: Arc<C>,
    clock: Arc<dyn Clock>,
    cooldowns: CooldownPolicy,
}

impl<R: ?Sized, C: ?Sized> Clone for EngagementService<R, C> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            catalogue: Arc::clone(&self.catalogue),
            clock: Arc::clone(&self.clock),
            cooldowns: self.cooldowns,
        }
    }
}

impl<R, C> EngagementService<R, C>
where
    R: EngagementRepository + ?Sized,
    C: ContentCatalogue + ?Sized,
{
    /// Create a service using the default cool-down windows.
    pub fn new(repository: Arc<R>, catalogue: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            catalogue,
            clock,
            cooldowns: CooldownPolicy::default(),
        }
    }

    /// Replace the cool-down windows.
    #[must_use]
    pub fn with_cooldowns(mut self, cooldowns: CooldownPolicy) -> Self {
        self.cooldowns = cooldowns;
        self
    }

    fn map_repository_error(error: EngagementRepositoryError) -> Error {
        match error {
            EngagementRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("engagement repository unavailable: {message}"))
            }
            EngagementRepositoryError::Query { message } => {
                Error::internal(format!("engagement repository error: {message}"))
            }
        }
    }

    fn map_catalogue_error(error: ContentCatalogueError) -> Error {
        match error {
            ContentCatalogueError::Connection { message } => {
                Error::service_unavailable(format!("content catalogue unavailable: {message}"))
            }
            ContentCatalogueError::Query { message } => {
                Error::internal(format!("content catalogue error: {message}"))
            }
        }
    }

    /// Engagement is only accepted on items the viewer may open.
    async fn ensure_visible(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<(), Error> {
        let item = self
            .catalogue
            .find_item(item_id)
            .await
            .map_err(Self::map_catalogue_error)?;
        match item {
            Some(item) if item.is_visible_to(Some(viewer_id)) => Ok(()),
            _ => Err(Error::not_found(format!("content item {item_id} not found"))),
        }
    }
}

#[async_trait]
impl<R, C> EngagementCommand for EngagementService<R, C>
where
    R: EngagementRepository + ?Sized,
    C: ContentCatalogue + ?Sized,
{
    async fn record_view(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
    ) -> Result<ViewOutcome, Error> {
        self.ensure_visible(item_id, viewer_id).await?;
        let now = self.clock.utc();
        let existing = self
            .repository
            .find_view_counter(item_id, viewer_id)
            .await
            .map_err(Self::map_repository_error)?;

        let counter = match existing {
            Some(counter) if !self.cooldowns.allows_view(counter.updated_at, now) => {
                debug!(%item_id, seen = counter.seen, "view inside cool-down; not counted");
                return Ok(ViewOutcome {
                    item_id: *item_id,
                    seen: counter.seen,
                    recorded: false,
                });
            }
            Some(counter) => counter.incremented(now),
            None => ViewCounter::first(*item_id, *viewer_id, now),
        };

        self.repository
            .save_view_counter(&counter)
            .await
            .map_err(Self::map_repository_error)?;
        Ok(ViewOutcome {
            item_id: *item_id,
            seen: counter.seen,
            recorded: true,
        })
    }

    async fn rate_item(
        &self,
        item_id: &ContentItemId,
        viewer_id: &UserId,
        rating: Rating,
    ) -> Result<RatingOutcome, Error> {
        self.ensure_visible(item_id, viewer_id).await?;
        let now = self.clock.utc();
        let existing = self
            .repository
            .find_rating(item_id, viewer_id)
            .await
            .map_err(Self::map_repository_error)?;

        if let Some(previous) =
            existing.filter(|previous| !self.cooldowns.allows_rating(previous.updated_at, now))
        {
            debug!(%item_id, "rating change inside cool-down; keeping previous rating");
            return Ok(RatingOutcome {
                item_id: *item_id,
                rating: previous.rating,
                recorded: false,
            });
        }

        let record = RatingRecord {
            item_id: *item_id,
            viewer_id: *viewer_id,
            rating,
            updated_at: now,
        };
        self.repository
            .save_rating(&record)
            .await
            .map_err(Self::map_repository_error)?;
        Ok(RatingOutcome {
            item_id: *item_id,
            rating,
            recorded: true,
        })
    }

    async fn follow(
        &self,
        follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error> {
        let edge = FollowEdge::new(*follower_id, *followed_id)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let changed = self
            .repository
            .insert_follow(&edge)
            .await
            .map_err(Self::map_repository_error)?;
        Ok(FollowOutcome {
            followed_id: *followed_id,
            following: true,
            changed,
        })
    }

    async fn unfollow(
        &self,
        follower_id: &UserId,
        followed_id: &UserId,
    ) -> Result<FollowOutcome, Error> {
        let edge = FollowEdge::new(*follower_id, *followed_id)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        let changed = self
            .repository
            .delete_follow(&edge)
            .await
            .map_err(Self::map_repository_error)?;
        Ok(FollowOutcome {
            followed_id: *followed_id,
            following: false,
            changed,
        })
    }
}
