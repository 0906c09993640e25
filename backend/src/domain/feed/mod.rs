//! Feed reading: content model, ordering, cursors, scoring and paging.

mod aggregates;
mod content;
mod cursor;
mod filters;
mod ordering;
mod relevance;
mod service;

pub use aggregates::{
    AggregateResolver, ItemStatistics, RatingSummary, StatisticsQuery, StatisticsSnapshot,
};
pub use content::{
    CategoryId, ContentItem, ContentItemId, ProcessingStatus, UnknownVariantError, Visibility,
};
pub use cursor::FeedCursorKey;
pub use filters::{FeedFilters, FeedMode, FeedModeParseError, FeedPredicate, SearchQuery};
pub use ordering::{FeedPosition, RecencyPosition, RelevancePosition, take_after};
pub use relevance::{
    DESCRIPTION_MATCH_WEIGHT, PARTIAL_TITLE_MATCH_WEIGHT, PopularitySignals, RelevanceScore,
    TITLE_MATCH_WEIGHT, TextMatch, VIEWS_PER_POPULARITY_POINT, score_item,
};
pub use service::FeedService;
