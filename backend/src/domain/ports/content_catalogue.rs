//! Driven port over the content item store.
//!
//! Adapters translate [`FeedPredicate`]s, relevance scoring and the resume
//! position into their own query language. Both the SQL and in-memory
//! adapters must honour the exact semantics of [`FeedPredicate::matches`],
//! [`score_item`] and
//! [`FeedPosition::is_after`](crate::domain::feed::FeedPosition::is_after),
//! and return at most the requested number of rows.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::feed::{
    ContentItem, ContentItemId, FeedPredicate, RecencyPosition, RelevancePosition,
    RelevanceScore, SearchQuery, take_after,
};
#[cfg(doc)]
use crate::domain::feed::score_item;

/// Request for one recency-ordered slice of the catalogue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentItemsRequest {
    /// Conjunctive filters.
    pub predicates: Vec<FeedPredicate>,
    /// Return only items strictly after this position.
    pub after: Option<RecencyPosition>,
    /// Maximum rows to return; callers pass the page limit plus one.
    pub limit: usize,
}

/// Order and resume position for a text-search slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOrder {
    /// Score descending, then id descending.
    Relevance {
        /// Return only items strictly after this position.
        after: Option<RelevancePosition>,
    },
    /// `updated_at` descending, then id descending.
    Recency {
        /// Return only items strictly after this position.
        after: Option<RecencyPosition>,
    },
}

/// Request for one slice of text-search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPageRequest {
    /// Conjunctive structural filters. Text matching is governed by `query`;
    /// a [`FeedPredicate::MentionsText`] here must carry the same query.
    pub predicates: Vec<FeedPredicate>,
    /// The query every returned item must match.
    pub query: SearchQuery,
    /// Result order and resume position.
    pub order: SearchOrder,
    /// Maximum rows to return; callers pass the page limit plus one.
    pub limit: usize,
}

impl SearchPageRequest {
    /// Place already scored rows in `self.order` and keep the requested
    /// window.
    ///
    /// In-process adapters score every candidate and call this; storage
    /// adapters express the same window in their query.
    pub fn select(&self, rows: Vec<ScoredItem>) -> Vec<ScoredItem> {
        match self.order {
            SearchOrder::Relevance { after } => take_after(
                rows.into_iter()
                    .map(|row| (RelevancePosition::new(row.score, row.item.id), row))
                    .collect(),
                after.as_ref(),
                self.limit,
            ),
            SearchOrder::Recency { after } => take_after(
                rows.into_iter()
                    .map(|row| (RecencyPosition::of(&row.item), row))
                    .collect(),
                after.as_ref(),
                self.limit,
            ),
        }
    }
}

/// A search hit with its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredItem {
    /// The matching item.
    pub item: ContentItem,
    /// Score computed from the item's text, views and ratings.
    pub score: RelevanceScore,
}

define_port_error! {
    /// Errors raised while reading content items.
    pub enum ContentCatalogueError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "content catalogue connection failed: {message}",
        /// Query failed during execution or returned undecodable rows.
        Query { message: String } =>
            "content catalogue query failed: {message}",
    }
}

/// Port for reading content items in feed order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentCatalogue: Send + Sync {
    /// Items matching `request.predicates`, after `request.after`, ordered by
    /// `updated_at` descending then id descending, at most `request.limit`.
    async fn fetch_recent(
        &self,
        request: &RecentItemsRequest,
    ) -> Result<Vec<ContentItem>, ContentCatalogueError>;

    /// Items matching `request.predicates` that [`score_item`] accepts for
    /// `request.query`, scored with their current view and rating totals,
    /// in `request.order` strictly after its resume position, at most
    /// `request.limit`.
    async fn search_page(
        &self,
        request: &SearchPageRequest,
    ) -> Result<Vec<ScoredItem>, ContentCatalogueError>;

    /// Look up one item regardless of eligibility.
    async fn find_item(
        &self,
        item_id: &ContentItemId,
    ) -> Result<Option<ContentItem>, ContentCatalogueError>;
}

/// Fixture catalogue that holds no items.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureContentCatalogue;

#[async_trait]
impl ContentCatalogue for FixtureContentCatalogue {
    async fn fetch_recent(
        &self,
        _request: &RecentItemsRequest,
    ) -> Result<Vec<ContentItem>, ContentCatalogueError> {
        Ok(Vec::new())
    }

    async fn search_page(
        &self,
        _request: &SearchPageRequest,
    ) -> Result<Vec<ScoredItem>, ContentCatalogueError> {
        Ok(Vec::new())
    }

    async fn find_item(
        &self,
        _item_id: &ContentItemId,
    ) -> Result<Option<ContentItem>, ContentCatalogueError> {
        Ok(None)
    }
}
