//! Content items served by the feed.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::UserId;

/// Unique content item identifier.
///
/// Ordering follows the UUID byte order, which matches both PostgreSQL's
/// `uuid` comparison and lexicographic order of the hyphenated lowercase form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentItemId(Uuid);

impl ContentItemId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ContentItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Category identifier used to narrow a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Raised when a persisted enumeration value is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariantError {
    kind: &'static str,
    value: String,
}

/// Who may see an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Listed in public feeds.
    Public,
    /// Visible to the owner only.
    Private,
}

impl Visibility {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for Visibility {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(UnknownVariantError {
                kind: "visibility",
                value: other.to_owned(),
            }),
        }
    }
}

/// Lifecycle of an uploaded item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStatus {
    /// Upload accepted; transcoding in progress.
    Processing,
    /// Ready to serve.
    Completed,
    /// Transcoding failed.
    Failed,
}

impl ProcessingStatus {
    /// Storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for ProcessingStatus {
    type Err = UnknownVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariantError {
                kind: "processing status",
                value: other.to_owned(),
            }),
        }
    }
}

/// A video or post as seen by the feed.
///
/// ## Invariants
/// - Only items that are [`Visibility::Public`] and
///   [`ProcessingStatus::Completed`] are eligible for any public feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Unique identifier.
    pub id: ContentItemId,
    /// Identity that uploaded the item.
    pub owner_id: UserId,
    /// Listing visibility.
    pub visibility: Visibility,
    /// Processing lifecycle state.
    pub status: ProcessingStatus,
    /// Optional browse category.
    pub category_id: Option<CategoryId>,
    /// Searchable title.
    pub title: Option<String>,
    /// Searchable description.
    pub description: Option<String>,
    /// When the upload was initiated.
    pub created_at: DateTime<Utc>,
    /// Last metadata or lifecycle change; the recency sort key.
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    /// Whether the item may appear in a public feed.
    pub fn is_eligible(&self) -> bool {
        self.visibility == Visibility::Public && self.status == ProcessingStatus::Completed
    }

    /// Whether `viewer` may open this item directly.
    ///
    /// Owners can always see their own items; everyone else only sees
    /// eligible ones.
    pub fn is_visible_to(&self, viewer: Option<&UserId>) -> bool {
        self.is_eligible() || viewer.is_some_and(|viewer| viewer == &self.owner_id)
    }
}
