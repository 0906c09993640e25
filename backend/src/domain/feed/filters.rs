//! Feed filter configuration and the predicate builder.
//!
//! [`FeedFilters::predicates`] maps the caller's filter object to a
//! conjunctive list of [`FeedPredicate`]s. Storage adapters translate each
//! predicate into their own query language; [`FeedPredicate::matches`] is the
//! reference semantics they must agree with.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::content::{CategoryId, ContentItem, ProcessingStatus, Visibility};
use crate::domain::UserId;

/// Requested feed ordering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Newest first.
    #[default]
    Recency,
    /// Best text match first; needs a non-empty query.
    Relevance,
}

impl FeedMode {
    /// Wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Relevance => "relevance",
        }
    }
}

/// Raised for an unrecognised mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("feed mode must be `recency` or `relevance`, got `{0}`")]
pub struct FeedModeParseError(String);

impl FromStr for FeedMode {
    type Err = FeedModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recency" => Ok(Self::Recency),
            "relevance" => Ok(Self::Relevance),
            _ => Err(FeedModeParseError(s.to_owned())),
        }
    }
}

/// Split `text` into lowercase alphanumeric tokens.
pub(crate) fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

/// A normalised, non-empty search query.
///
/// # Examples
/// ```
/// use feed_backend::domain::feed::SearchQuery;
///
/// let query = SearchQuery::parse("  Rust   Tutorials ").expect("non-empty");
/// assert_eq!(query.phrase(), "rust tutorials");
/// assert_eq!(query.terms(), ["rust", "tutorials"]);
/// assert!(SearchQuery::parse("   ").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    phrase: String,
    terms: Vec<String>,
}

impl SearchQuery {
    /// Normalise `raw`; `None` when it is empty or whitespace only.
    pub fn parse(raw: &str) -> Option<Self> {
        let phrase = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if phrase.is_empty() {
            return None;
        }
        let mut terms: Vec<String> = Vec::new();
        for term in tokenize(&phrase) {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        Some(Self { phrase, terms })
    }

    /// Lowercase query with whitespace collapsed.
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Distinct alphanumeric terms in query order. May be empty for queries
    /// made only of punctuation.
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Whether `text` mentions the phrase or any term, ignoring case.
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        haystack.contains(&self.phrase) || self.terms.iter().any(|term| haystack.contains(term))
    }
}

/// Filter configuration for a feed request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    /// Requested ordering.
    pub mode: FeedMode,
    /// Optional text query.
    pub query: Option<SearchQuery>,
    /// Restrict to one category.
    pub category_id: Option<CategoryId>,
    /// Restrict to one owner's items.
    pub owner_id: Option<UserId>,
    /// Identity used for personalised statistics; never widens visibility.
    pub viewer_id: Option<UserId>,
}

impl FeedFilters {
    /// The ordering actually applied.
    ///
    /// Relevance needs a query to score against; without one the feed falls
    /// back to recency.
    pub fn effective_mode(&self) -> FeedMode {
        match (self.mode, &self.query) {
            (FeedMode::Relevance, Some(_)) => FeedMode::Relevance,
            _ => FeedMode::Recency,
        }
    }

    /// Build the conjunctive predicate list for these filters.
    ///
    /// # Examples
    /// ```
    /// use feed_backend::domain::feed::{FeedFilters, FeedPredicate};
    ///
    /// let predicates = FeedFilters::default().predicates();
    /// assert_eq!(
    ///     predicates,
    ///     vec![FeedPredicate::PublicVisibility, FeedPredicate::ProcessingCompleted]
    /// );
    /// ```
    pub fn predicates(&self) -> Vec<FeedPredicate> {
        let mut predicates = vec![
            FeedPredicate::PublicVisibility,
            FeedPredicate::ProcessingCompleted,
        ];
        if let Some(category_id) = self.category_id {
            predicates.push(FeedPredicate::InCategory(category_id));
        }
        if let Some(owner_id) = self.owner_id {
            predicates.push(FeedPredicate::OwnedBy(owner_id));
        }
        if let Some(query) = &self.query {
            predicates.push(FeedPredicate::MentionsText(query.clone()));
        }
        predicates
    }
}

/// One storage-agnostic filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPredicate {
    /// `visibility = public`.
    PublicVisibility,
    /// `status = completed`.
    ProcessingCompleted,
    /// `category_id = ?`.
    InCategory(CategoryId),
    /// `owner_id = ?`.
    OwnedBy(UserId),
    /// Title or description mentions the query phrase or any of its terms.
    ///
    /// This is a deliberately loose superset; relevance scoring decides which
    /// candidates actually match.
    MentionsText(SearchQuery),
}

impl FeedPredicate {
    /// Evaluate the predicate against an item.
    pub fn matches(&self, item: &ContentItem) -> bool {
        match self {
            Self::PublicVisibility => item.visibility == Visibility::Public,
            Self::ProcessingCompleted => item.status == ProcessingStatus::Completed,
            Self::InCategory(category_id) => item.category_id == Some(*category_id),
            Self::OwnedBy(owner_id) => &item.owner_id == owner_id,
            Self::MentionsText(query) => [item.title.as_deref(), item.description.as_deref()]
                .into_iter()
                .flatten()
                .any(|text| query.is_mentioned_in(text)),
        }
    }

    /// Evaluate every predicate in `predicates` against `item`.
    pub fn all_match(predicates: &[Self], item: &ContentItem) -> bool {
        predicates.iter().all(|predicate| predicate.matches(item))
    }
}
