//! Relevance scoring for text-query feeds.
//!
//! The score is the sum of the applicable components:
//!
//! | Component | Contribution |
//! |-----------|--------------|
//! | every query term is a title token | 10 |
//! | every query term is a description token | 5 |
//! | title contains the phrase or any term as a substring | 3 |
//! | popularity | `view_count / 1000` |
//! | rating | `average_rating` (0 to 5) |
//!
//! An item matches the query only when at least one text component applies;
//! popularity and rating never make an unrelated item match.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::aggregates::RatingSummary;
use super::content::ContentItem;
use super::filters::{SearchQuery, tokenize};

/// Weight for a full title match.
pub const TITLE_MATCH_WEIGHT: f64 = 10.0;
/// Weight for a full description match.
pub const DESCRIPTION_MATCH_WEIGHT: f64 = 5.0;
/// Weight for a substring title match.
pub const PARTIAL_TITLE_MATCH_WEIGHT: f64 = 3.0;
/// Views needed to add one point of popularity.
pub const VIEWS_PER_POPULARITY_POINT: f64 = 1000.0;

/// Composite relevance score; non-negative and finite.
///
/// Ordered with [`f64::total_cmp`] so it can serve as a sort key.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelevanceScore(f64);

impl RelevanceScore {
    /// Wrap a raw score.
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// The raw score.
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for RelevanceScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RelevanceScore {}

impl PartialOrd for RelevanceScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelevanceScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Which text components of the score apply to an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextMatch {
    /// All terms appear among the title tokens.
    pub title: bool,
    /// All terms appear among the description tokens.
    pub description: bool,
    /// The title contains the phrase or a term as a substring.
    pub partial_title: bool,
}

impl TextMatch {
    /// Evaluate `query` against the item's text fields.
    pub fn evaluate(query: &SearchQuery, item: &ContentItem) -> Self {
        let title = item.title.as_deref().unwrap_or_default();
        let description = item.description.as_deref().unwrap_or_default();
        Self {
            title: contains_all_terms(query, title),
            description: contains_all_terms(query, description),
            partial_title: !title.is_empty() && query.is_mentioned_in(title),
        }
    }

    /// Whether any text component applies.
    pub const fn is_match(self) -> bool {
        self.title || self.description || self.partial_title
    }

    /// Sum of the applicable text weights.
    pub fn weight(self) -> f64 {
        [
            (self.title, TITLE_MATCH_WEIGHT),
            (self.description, DESCRIPTION_MATCH_WEIGHT),
            (self.partial_title, PARTIAL_TITLE_MATCH_WEIGHT),
        ]
        .into_iter()
        .filter_map(|(applies, weight)| applies.then_some(weight))
        .sum()
    }
}

fn contains_all_terms(query: &SearchQuery, text: &str) -> bool {
    if query.terms().is_empty() || text.is_empty() {
        return false;
    }
    let tokens: Vec<String> = tokenize(text).collect();
    query.terms().iter().all(|term| tokens.contains(term))
}

/// Popularity inputs to the score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PopularitySignals {
    /// Total views across all viewers.
    pub view_count: i64,
    /// Mean rating, 0 when unrated.
    pub average_rating: f64,
}

impl PopularitySignals {
    /// Build signals from raw aggregates.
    pub fn new(view_count: i64, ratings: RatingSummary) -> Self {
        Self {
            view_count,
            average_rating: ratings.average(),
        }
    }

    fn boost(self) -> f64 {
        let views = self.view_count.max(0) as f64;
        views / VIEWS_PER_POPULARITY_POINT + self.average_rating.max(0.0)
    }
}

/// Score `item` against `query`; `None` when the item does not match.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use feed_backend::domain::UserId;
/// use feed_backend::domain::feed::{
///     ContentItem, ContentItemId, PopularitySignals, ProcessingStatus, SearchQuery, Visibility,
///     score_item,
/// };
///
/// let now = Utc::now();
/// let item = ContentItem {
///     id: ContentItemId::random(),
///     owner_id: UserId::random(),
///     visibility: Visibility::Public,
///     status: ProcessingStatus::Completed,
///     category_id: None,
///     title: Some("Rust for beginners".to_owned()),
///     description: None,
///     created_at: now,
///     updated_at: now,
/// };
/// let query = SearchQuery::parse("rust").expect("query");
/// let signals = PopularitySignals { view_count: 2000, average_rating: 4.0 };
/// let score = score_item(&query, &item, signals).expect("matches");
/// assert_eq!(score.value(), 10.0 + 3.0 + 2.0 + 4.0);
/// ```
pub fn score_item(
    query: &SearchQuery,
    item: &ContentItem,
    signals: PopularitySignals,
) -> Option<RelevanceScore> {
    let text = TextMatch::evaluate(query, item);
    text.is_match()
        .then(|| RelevanceScore::new(text.weight() + signals.boost()))
}
