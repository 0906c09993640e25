//! Page fetcher implementing the [`FeedQuery`] driving port.
//!
//! Every page is produced the same way: gather up to `limit + 1` rows in
//! feed order strictly after the resume position, keep the first `limit`,
//! and mint the next cursor from the last kept row only when the extra row
//! proved another page exists.
//!
//! Feeds without a text query page via [`ContentCatalogue::fetch_recent`].
//! Feeds with a query page via [`ContentCatalogue::search_page`], which
//! scores in storage so the relevance score can act as the primary key.
//! Either way only the lookahead window crosses the port.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::PageLimit;
use tracing::debug;

use super::aggregates::AggregateResolver;
use super::content::{ContentItem, ContentItemId};
use super::cursor::FeedCursorKey;
use super::filters::{FeedFilters, FeedMode, FeedPredicate, SearchQuery};
use super::ordering::{RecencyPosition, RelevancePosition};
use super::relevance::RelevanceScore;
use crate::domain::ports::{
    ContentCatalogue, ContentCatalogueError, EngagementStatistics, EngagementStatisticsError,
    FeedEntry, FeedPage, FeedPageRequest, FeedQuery, RecentItemsRequest, ScoredItem, SearchOrder,
    SearchPageRequest,
};
use crate::domain::{Error, UserId};

/// An item placed in feed order, ready to become a page entry.
#[derive(Debug, Clone)]
struct RankedItem {
    item: ContentItem,
    score: Option<RelevanceScore>,
    key: FeedCursorKey,
}

impl RankedItem {
    fn by_recency(item: ContentItem, score: Option<RelevanceScore>) -> Self {
        let key = FeedCursorKey::recency(RecencyPosition::of(&item));
        Self { item, score, key }
    }

    fn by_relevance(item: ContentItem, score: RelevanceScore) -> Self {
        let key = FeedCursorKey::relevance(RelevancePosition::new(score, item.id));
        Self {
            item,
            score: Some(score),
            key,
        }
    }
}

/// Keep the first `limit` rows and report whether more followed.
fn split_lookahead<T>(mut rows: Vec<T>, limit: PageLimit) -> (Vec<T>, bool) {
    let has_more = rows.len() > limit.as_usize();
    rows.truncate(limit.as_usize());
    (rows, has_more)
}

/// Feed service backed by a content catalogue and an engagement statistics
/// port.
pub struct FeedService<C: ?Sized, S: ?Sized> {
    catalogue: Arc<C>,
    resolver: AggregateResolver<S>,
}

impl<C: ?Sized, S: ?Sized> Clone for FeedService<C, S> {
    fn clone(&self) -> Self {
        Self {
            catalogue: Arc::clone(&self.catalogue),
            resolver: self.resolver.clone(),
        }
    }
}

impl<C, S> FeedService<C, S>
where
    C: ContentCatalogue + ?Sized,
    S: EngagementStatistics + ?Sized,
{
    /// Create a feed service.
    ///
    /// ```rust,no_run
    /// # use std::sync::Arc;
    /// # use feed_backend::domain::feed::FeedService;
    /// # use feed_backend::domain::ports::{FixtureContentCatalogue, FixtureEngagementStatistics};
    /// let service = FeedService::new(
    ///     Arc::new(FixtureContentCatalogue),
    ///     Arc::new(FixtureEngagementStatistics),
    /// );
    /// # let _ = service;
    /// ```
    pub fn new(catalogue: Arc<C>, statistics: Arc<S>) -> Self {
        Self {
            catalogue,
            resolver: AggregateResolver::new(statistics),
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

    fn map_statistics_error(error: EngagementStatisticsError) -> Error {
        match error {
            EngagementStatisticsError::Connection { message } => {
                Error::service_unavailable(format!("engagement statistics unavailable: {message}"))
            }
            EngagementStatisticsError::Query { message } => {
                Error::internal(format!("engagement statistics error: {message}"))
            }
        }
    }

    /// Recency page without a text query; ordering and the resume predicate
    /// run in storage.
    async fn recent_window(
        &self,
        filters: &FeedFilters,
        resume: Option<FeedCursorKey>,
        limit: PageLimit,
    ) -> Result<Vec<RankedItem>, Error> {
        let request = RecentItemsRequest {
            predicates: filters.predicates(),
            after: resume.and_then(|key| key.recency_position()),
            limit: limit.lookahead(),
        };
        let items = self
            .catalogue
            .fetch_recent(&request)
            .await
            .map_err(Self::map_catalogue_error)?;
        Ok(items
            .into_iter()
            .map(|item| RankedItem::by_recency(item, None))
            .collect())
    }

    /// Text-query page, scored and ordered by the catalogue.
    async fn search_window(
        &self,
        filters: &FeedFilters,
        query: &SearchQuery,
        resume: Option<FeedCursorKey>,
        limit: PageLimit,
    ) -> Result<Vec<RankedItem>, Error> {
        let order = match filters.effective_mode() {
            FeedMode::Relevance => SearchOrder::Relevance {
                after: resume.and_then(|key| key.relevance_position()),
            },
            FeedMode::Recency => SearchOrder::Recency {
                after: resume.and_then(|key| key.recency_position()),
            },
        };
        let mut predicates = filters.predicates();
        predicates.retain(|predicate| !matches!(predicate, FeedPredicate::MentionsText(_)));
        let request = SearchPageRequest {
            predicates,
            query: query.clone(),
            order,
            limit: limit.lookahead(),
        };
        let rows = self
            .catalogue
            .search_page(&request)
            .await
            .map_err(Self::map_catalogue_error)?;

        Ok(rows
            .into_iter()
            .map(|ScoredItem { item, score }| match order {
                SearchOrder::Relevance { .. } => RankedItem::by_relevance(item, score),
                SearchOrder::Recency { .. } => RankedItem::by_recency(item, Some(score)),
            })
            .collect())
    }

    async fn attach_statistics(
        &self,
        ranked: Vec<RankedItem>,
        viewer_id: Option<&UserId>,
    ) -> Result<Vec<FeedEntry>, Error> {
        let items: Vec<ContentItem> = ranked.iter().map(|row| row.item.clone()).collect();
        let statistics = self
            .resolver
            .resolve(&items, viewer_id)
            .await
            .map_err(Self::map_statistics_error)?;
        Ok(ranked
            .into_iter()
            .zip(statistics)
            .map(|(row, statistics)| FeedEntry {
                item: row.item,
                statistics,
                score: row.score,
            })
            .collect())
    }
}

#[async_trait]
impl<C, S> FeedQuery for FeedService<C, S>
where
    C: ContentCatalogue + ?Sized,
    S: EngagementStatistics + ?Sized,
{
    async fn fetch_page(&self, request: &FeedPageRequest) -> Result<FeedPage, Error> {
        let filters = &request.filters;
        let mode = filters.effective_mode();
        let resume = FeedCursorKey::resume(request.cursor.as_deref(), mode);

        let window = match &filters.query {
            Some(query) => {
                self.search_window(filters, query, resume, request.limit)
                    .await?
            }
            None => self.recent_window(filters, resume, request.limit).await?,
        };
        let (rows, has_more) = split_lookahead(window, request.limit);

        let next_cursor = match rows.last() {
            Some(last) if has_more => Some(
                last.key
                    .encode()
                    .map_err(|err| Error::internal(format!("failed to encode cursor: {err}")))?,
            ),
            _ => None,
        };

        let entries = self
            .attach_statistics(rows, filters.viewer_id.as_ref())
            .await?;

        debug!(
            mode = mode.as_str(),
            limit = request.limit.get(),
            returned = entries.len(),
            resumed = resume.is_some(),
            has_more,
            "served feed page"
        );

        Ok(FeedPage {
            entries,
            next_cursor,
        })
    }

    async fn fetch_item(
        &self,
        item_id: &ContentItemId,
        viewer_id: Option<UserId>,
    ) -> Result<FeedEntry, Error> {
        let not_found = || Error::not_found(format!("content item {item_id} not found"));
        let item = self
            .catalogue
            .find_item(item_id)
            .await
            .map_err(Self::map_catalogue_error)?
            .filter(|item| item.is_visible_to(viewer_id.as_ref()))
            .ok_or_else(not_found)?;

        let mut entries = self
            .attach_statistics(vec![RankedItem::by_recency(item, None)], viewer_id.as_ref())
            .await?;
        entries.pop().ok_or_else(not_found)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
