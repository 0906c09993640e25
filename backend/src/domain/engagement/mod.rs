//! Write-side engagement counters: views, ratings and follow edges.
//!
//! Repeat views and rating changes are rate limited by a cool-down measured
//! from the previous accepted write. A write inside the cool-down is a silent
//! no-op that reports the unchanged state.

mod service;

pub use service::EngagementService;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;
use crate::domain::feed::ContentItemId;

/// Default cool-down between counted views by the same viewer.
pub const DEFAULT_VIEW_COOLDOWN: TimeDelta = TimeDelta::hours(1);
/// Default cool-down between rating changes by the same viewer.
pub const DEFAULT_RATING_COOLDOWN: TimeDelta = TimeDelta::minutes(1);

/// Raised when a rating falls outside [`Rating::MIN`]..=[`Rating::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating must be between {min} and {max}, got {value}", min = Rating::MIN, max = Rating::MAX)]
pub struct RatingValidationError {
    value: i64,
}

/// Integer rating in `1..=5`.
///
/// # Examples
/// ```
/// use feed_backend::domain::engagement::Rating;
///
/// assert_eq!(Rating::new(4).map(Rating::get), Ok(4));
/// assert!(Rating::new(0).is_err());
/// assert!(Rating::new(6).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Lowest accepted rating.
    pub const MIN: u8 = 1;
    /// Highest accepted rating.
    pub const MAX: u8 = 5;

    /// Validate `value` as a rating.
    pub fn new(value: i64) -> Result<Self, RatingValidationError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingValidationError { value })
    }

    /// The rating value.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = RatingValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(value: Rating) -> Self {
        value.0
    }
}

/// Cumulative views of one item by one viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewCounter {
    /// Viewed item.
    pub item_id: ContentItemId,
    /// Viewer.
    pub viewer_id: UserId,
    /// Counted views; never decreases.
    pub seen: i32,
    /// Time of the last counted view.
    pub updated_at: DateTime<Utc>,
}

impl ViewCounter {
    /// Counter for a first view.
    pub const fn first(item_id: ContentItemId, viewer_id: UserId, at: DateTime<Utc>) -> Self {
        Self {
            item_id,
            viewer_id,
            seen: 1,
            updated_at: at,
        }
    }

    /// Counter after one more counted view.
    pub const fn incremented(self, at: DateTime<Utc>) -> Self {
        Self {
            seen: self.seen.saturating_add(1),
            updated_at: at,
            ..self
        }
    }
}

/// One viewer's rating of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingRecord {
    /// Rated item.
    pub item_id: ContentItemId,
    /// Viewer who rated.
    pub viewer_id: UserId,
    /// Current rating.
    pub rating: Rating,
    /// Time of the last accepted change.
    pub updated_at: DateTime<Utc>,
}

/// Raised when a follow edge would point at its own follower.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("users cannot follow themselves")]
pub struct SelfFollowError;

/// Directed follower → followed edge; never a self-edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    follower_id: UserId,
    followed_id: UserId,
}

impl FollowEdge {
    /// Validate and construct an edge.
    pub fn new(follower_id: UserId, followed_id: UserId) -> Result<Self, SelfFollowError> {
        if follower_id == followed_id {
            return Err(SelfFollowError);
        }
        Ok(Self {
            follower_id,
            followed_id,
        })
    }

    /// The identity doing the following.
    pub const fn follower_id(&self) -> UserId {
        self.follower_id
    }

    /// The identity being followed.
    pub const fn followed_id(&self) -> UserId {
        self.followed_id
    }
}

/// Cool-down windows for rate-limited counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownPolicy {
    /// Minimum gap between counted views.
    pub view: TimeDelta,
    /// Minimum gap between rating changes.
    pub rating: TimeDelta,
}

impl Default for CooldownPolicy {
    fn default() -> Self {
        Self {
            view: DEFAULT_VIEW_COOLDOWN,
            rating: DEFAULT_RATING_COOLDOWN,
        }
    }
}

impl CooldownPolicy {
    /// Whether a view at `now` counts, given the last counted view.
    pub fn allows_view(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last) >= self.view
    }

    /// Whether a rating change at `now` is accepted, given the last change.
    pub fn allows_rating(&self, last: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last) >= self.rating
    }
}

/// Result of recording a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOutcome {
    /// Viewed item.
    pub item_id: ContentItemId,
    /// The viewer's counted views after this call.
    pub seen: i32,
    /// Whether this call incremented the counter.
    pub recorded: bool,
}

/// Result of rating an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingOutcome {
    /// Rated item.
    pub item_id: ContentItemId,
    /// The stored rating after this call.
    pub rating: Rating,
    /// Whether this call changed the stored rating.
    pub recorded: bool,
}

/// Result of a follow or unfollow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowOutcome {
    /// Followed identity.
    pub followed_id: UserId,
    /// Whether the edge exists after this call.
    pub following: bool,
    /// Whether this call added or removed the edge.
    pub changed: bool,
}
