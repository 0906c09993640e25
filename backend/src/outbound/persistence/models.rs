//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{content_items, follow_edges, ratings, view_counters};

/// Row struct for reading from the content_items table.
#[derive(Debug, Clone, Queryable, QueryableByName, Selectable)]
#[diesel(table_name = content_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContentItemRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub visibility: String,
    pub status: String,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A content row with the relevance score computed alongside it.
#[derive(Debug, Clone, QueryableByName)]
pub(crate) struct ScoredItemRow {
    #[diesel(embed)]
    pub item: ContentItemRow,
    #[diesel(sql_type = diesel::sql_types::Double)]
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Engagement models
// ---------------------------------------------------------------------------

/// Row struct for reading and upserting the view_counters table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = view_counters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ViewCounterRow {
    pub item_id: Uuid,
    pub viewer_id: Uuid,
    pub seen: i32,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading and upserting the ratings table.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = ratings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct RatingRow {
    pub item_id: Uuid,
    pub viewer_id: Uuid,
    pub rating: i16,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for new follow edges; `created_at` uses the column
/// default.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follow_edges)]
pub(crate) struct NewFollowEdgeRow {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
}
