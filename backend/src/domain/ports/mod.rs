//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports ([`FeedQuery`], [`EngagementCommand`]) are implemented by
//! domain services and called by inbound adapters. Driven ports
//! ([`ContentCatalogue`], [`EngagementStatistics`], [`EngagementRepository`])
//! are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod content_catalogue;
mod engagement_command;
mod engagement_repository;
mod engagement_statistics;
mod feed_query;

#[cfg(test)]
pub use content_catalogue::MockContentCatalogue;
pub use content_catalogue::{
    ContentCatalogue, ContentCatalogueError, FixtureContentCatalogue, RecentItemsRequest,
    ScoredItem, SearchOrder, SearchPageRequest,
};
#[cfg(test)]
pub use engagement_command::MockEngagementCommand;
pub use engagement_command::{EngagementCommand, FixtureEngagementCommand};
#[cfg(test)]
pub use engagement_repository::MockEngagementRepository;
pub use engagement_repository::{
    EngagementRepository, EngagementRepositoryError, FixtureEngagementRepository,
};
#[cfg(test)]
pub use engagement_statistics::MockEngagementStatistics;
pub use engagement_statistics::{
    EngagementStatistics, EngagementStatisticsError, FixtureEngagementStatistics,
};
#[cfg(test)]
pub use feed_query::MockFeedQuery;
pub use feed_query::{FeedEntry, FeedPage, FeedPageRequest, FeedQuery, FixtureFeedQuery};
