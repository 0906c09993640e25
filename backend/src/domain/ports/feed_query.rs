//! Driving port for reading feeds.
//!
//! Inbound adapters call this port with validated filters and the raw cursor
//! token; the implementation owns cursor decoding so a malformed token can be
//! recovered instead of rejected.

use async_trait::async_trait;
use pagination::PageLimit;

use crate::domain::feed::{ContentItem, ContentItemId, FeedFilters, ItemStatistics, RelevanceScore};
use crate::domain::{Error, UserId};

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPageRequest {
    /// Filters and ordering.
    pub filters: FeedFilters,
    /// Opaque token returned with the previous page.
    pub cursor: Option<String>,
    /// Validated page size.
    pub limit: PageLimit,
}

/// An item with its resolved statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// The item.
    pub item: ContentItem,
    /// Aggregates joined for the current viewer.
    pub statistics: ItemStatistics,
    /// Relevance score, present for text-search feeds.
    pub score: Option<RelevanceScore>,
}

/// One page of a feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    /// Entries in feed order.
    pub entries: Vec<FeedEntry>,
    /// Token resuming after the last entry; `None` on the last page.
    pub next_cursor: Option<String>,
}

/// Domain use-case port for feed reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedQuery: Send + Sync {
    /// Fetch one page of the feed described by `request`.
    async fn fetch_page(&self, request: &FeedPageRequest) -> Result<FeedPage, Error>;

    /// Fetch one item with statistics.
    ///
    /// Items that are missing, or not eligible and not owned by `viewer_id`,
    /// are reported as not found.
    async fn fetch_item(
        &self,
        item_id: &ContentItemId,
        viewer_id: Option<UserId>,
    ) -> Result<FeedEntry, Error>;
}

/// Fixture feed query serving an empty catalogue.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureFeedQuery;

#[async_trait]
impl FeedQuery for FixtureFeedQuery {
    async fn fetch_page(&self, _request: &FeedPageRequest) -> Result<FeedPage, Error> {
        Ok(FeedPage::default())
    }

    async fn fetch_item(
        &self,
        item_id: &ContentItemId,
        _viewer_id: Option<UserId>,
    ) -> Result<FeedEntry, Error> {
        Err(Error::not_found(format!("content item {item_id} not found")))
    }
}
