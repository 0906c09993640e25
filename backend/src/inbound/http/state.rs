//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use pagination::PageLimit;

use crate::domain::ports::{EngagementCommand, FeedQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Feed and single-item reads.
    pub feed: Arc<dyn FeedQuery>,
    /// View, rating and follow writes.
    pub engagement: Arc<dyn EngagementCommand>,
    /// Page size applied when a request omits `limit`.
    pub default_limit: PageLimit,
}

impl HttpState {
    /// Construct state from the driving ports using the default page size.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use feed_backend::domain::ports::{FixtureEngagementCommand, FixtureFeedQuery};
    /// use feed_backend::inbound::http::state::HttpState;
    /// use pagination::PageLimit;
    ///
    /// let state = HttpState::new(Arc::new(FixtureFeedQuery), Arc::new(FixtureEngagementCommand))
    ///     .with_default_limit(PageLimit::new(10).expect("limit"));
    /// assert_eq!(state.default_limit.get(), 10);
    /// ```
    pub fn new(feed: Arc<dyn FeedQuery>, engagement: Arc<dyn EngagementCommand>) -> Self {
        Self {
            feed,
            engagement,
            default_limit: PageLimit::default(),
        }
    }

    /// Override the page size used when `limit` is omitted.
    #[must_use]
    pub fn with_default_limit(mut self, limit: PageLimit) -> Self {
        self.default_limit = limit;
        self
    }
}
