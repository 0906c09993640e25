//! Feed-specific cursor keys.
//!
//! A cursor records the last served item's position together with the order
//! it belongs to, so a token minted by one ordering is never replayed against
//! another. Tokens are untrusted: anything that fails to decode, or belongs to
//! the wrong order, restarts the feed.

use chrono::{DateTime, Utc};
use pagination::{Cursor, CursorError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::content::ContentItemId;
use super::filters::FeedMode;
use super::ordering::{RecencyPosition, RelevancePosition};
use super::relevance::RelevanceScore;

/// Serialised resume position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum FeedCursorKey {
    /// Position in the recency order.
    Recency {
        /// `updated_at` of the last served item.
        updated_at: DateTime<Utc>,
        /// Identifier of the last served item.
        id: ContentItemId,
    },
    /// Position in the relevance order.
    Relevance {
        /// Score of the last served item.
        score: RelevanceScore,
        /// Identifier of the last served item.
        id: ContentItemId,
    },
}

impl FeedCursorKey {
    /// Key for a recency position.
    pub fn recency(position: RecencyPosition) -> Self {
        Self::Recency {
            updated_at: position.key,
            id: position.id,
        }
    }

    /// Key for a relevance position.
    pub fn relevance(position: RelevancePosition) -> Self {
        Self::Relevance {
            score: position.key,
            id: position.id,
        }
    }

    /// The ordering this key belongs to.
    pub const fn mode(&self) -> FeedMode {
        match self {
            Self::Recency { .. } => FeedMode::Recency,
            Self::Relevance { .. } => FeedMode::Relevance,
        }
    }

    /// The recency position, if this is a recency key.
    pub fn recency_position(&self) -> Option<RecencyPosition> {
        match *self {
            Self::Recency { updated_at, id } => Some(RecencyPosition { key: updated_at, id }),
            Self::Relevance { .. } => None,
        }
    }

    /// The relevance position, if this is a relevance key.
    pub fn relevance_position(&self) -> Option<RelevancePosition> {
        match *self {
            Self::Relevance { score, id } => Some(RelevancePosition { key: score, id }),
            Self::Recency { .. } => None,
        }
    }

    /// Encode as an opaque token.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use feed_backend::domain::feed::{ContentItemId, FeedCursorKey};
    ///
    /// let key = FeedCursorKey::Recency {
    ///     updated_at: Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("instant"),
    ///     id: ContentItemId::random(),
    /// };
    /// let token = key.encode().expect("encodes");
    /// assert_eq!(FeedCursorKey::decode(&token), Ok(key));
    /// ```
    pub fn encode(&self) -> Result<String, CursorError> {
        Cursor::new(*self).encode()
    }

    /// Decode a token produced by [`FeedCursorKey::encode`].
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        Cursor::<Self>::decode(token).map(Cursor::into_inner)
    }

    /// Decode `token` for a feed ordered by `mode`.
    ///
    /// Malformed tokens and tokens minted for another ordering are logged and
    /// discarded so the feed starts from the beginning.
    pub fn resume(token: Option<&str>, mode: FeedMode) -> Option<Self> {
        let token = token?;
        match Self::decode(token) {
            Ok(key) if key.mode() == mode => Some(key),
            Ok(key) => {
                warn!(
                    expected = mode.as_str(),
                    found = key.mode().as_str(),
                    "cursor belongs to another feed order; starting from the beginning"
                );
                None
            }
            Err(error) => {
                warn!(%error, "discarding malformed feed cursor");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::TimeZone;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn instant(nanos: i64) -> DateTime<Utc> {
        Utc.timestamp_nanos(nanos)
    }

    #[rstest]
    #[case(instant(1_700_000_000_123_000_000))]
    #[case(instant(1_700_000_000_123_456_789))]
    #[case(instant(0))]
    fn recency_keys_round_trip_without_precision_loss(#[case] updated_at: DateTime<Utc>) {
        let key = FeedCursorKey::Recency {
            updated_at,
            id: ContentItemId::random(),
        };
        let token = key.encode().expect("encode");
        assert_eq!(FeedCursorKey::decode(&token), Ok(key));
    }

    #[rstest]
    #[case(0.0)]
    #[case(13.004)]
    #[case(0.1 + 0.2)]
    fn relevance_keys_round_trip_exactly(#[case] score: f64) {
        let key = FeedCursorKey::Relevance {
            score: RelevanceScore::new(score),
            id: ContentItemId::random(),
        };
        let token = key.encode().expect("encode");
        let decoded = FeedCursorKey::decode(&token).expect("decode");
        let position = decoded.relevance_position().expect("relevance key");
        assert_eq!(position.key.value().to_bits(), score.to_bits());
    }

    #[rstest]
    fn scores_with_fractional_averages_round_trip_exactly() {
        let mut rng = SmallRng::seed_from_u64(0x5c0e);
        for _ in 0..20_000 {
            let count: i64 = rng.gen_range(1..=50);
            let sum = rng.gen_range(count..=count * 5);
            let views: i64 = rng.gen_range(0..5_000_000);
            let score = 13.0 + views as f64 / 1000.0 + sum as f64 / count as f64;
            let key = FeedCursorKey::Relevance {
                score: RelevanceScore::new(score),
                id: ContentItemId::random(),
            };
            let token = key.encode().expect("encode");
            let position = FeedCursorKey::decode(&token)
                .expect("decode")
                .relevance_position()
                .expect("relevance key");
            assert_eq!(
                position.key.value().to_bits(),
                score.to_bits(),
                "score {score} changed after decoding"
            );
        }
    }

    #[rstest]
    fn unknown_fields_are_tolerated() {
        let id = ContentItemId::random();
        let payload = format!(
            r#"{{"order":"recency","updated_at":"2026-01-04T10:15:30.123Z","id":"{id}","shard":3}}"#
        );
        let token = URL_SAFE_NO_PAD.encode(payload);
        let key = FeedCursorKey::decode(&token).expect("decode");
        assert_eq!(key.recency_position().map(|p| p.id), Some(id));
    }

    #[rstest]
    fn missing_identifier_is_malformed() {
        let token = URL_SAFE_NO_PAD.encode(r#"{"order":"recency","updated_at":"2026-01-04T10:15:30Z"}"#);
        assert!(FeedCursorKey::decode(&token).is_err());
    }

    #[rstest]
    fn invalid_timestamp_is_malformed() {
        let id = ContentItemId::random();
        let token = URL_SAFE_NO_PAD.encode(format!(
            r#"{{"order":"recency","updated_at":"yesterday","id":"{id}"}}"#
        ));
        assert!(FeedCursorKey::decode(&token).is_err());
    }

    #[rstest]
    #[case(None)]
    #[case(Some("%%%"))]
    #[case(Some(""))]
    fn resume_starts_fresh_without_a_usable_token(#[case] token: Option<&str>) {
        assert_eq!(FeedCursorKey::resume(token, FeedMode::Recency), None);
    }

    #[rstest]
    fn resume_rejects_keys_from_another_order() {
        let key = FeedCursorKey::Relevance {
            score: RelevanceScore::new(4.0),
            id: ContentItemId::random(),
        };
        let token = key.encode().expect("encode");
        assert_eq!(FeedCursorKey::resume(Some(&token), FeedMode::Recency), None);
        assert_eq!(
            FeedCursorKey::resume(Some(&token), FeedMode::Relevance),
            Some(key)
        );
    }
}
