//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. The
//! `diesel print-schema` command regenerates them from a live database.

diesel::table! {
    /// Uploaded content served by the feed.
    ///
    /// `title` and `description` are stored as empty strings when absent so
    /// text matching never has to special-case NULL.
    content_items (id) {
        id -> Uuid,
        owner_id -> Uuid,
        /// `public` or `private`.
        visibility -> Text,
        /// `processing`, `completed` or `failed`.
        status -> Text,
        category_id -> Nullable<Uuid>,
        title -> Text,
        description -> Text,
        created_at -> Timestamptz,
        /// Recency sort key.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Cumulative views per (item, viewer) pair.
    view_counters (item_id, viewer_id) {
        item_id -> Uuid,
        viewer_id -> Uuid,
        seen -> Int4,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Current rating per (item, viewer) pair.
    ratings (item_id, viewer_id) {
        item_id -> Uuid,
        viewer_id -> Uuid,
        rating -> Int2,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follower → followed edges.
    follow_edges (follower_id, followed_id) {
        follower_id -> Uuid,
        followed_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(view_counters -> content_items (item_id));
diesel::joinable!(ratings -> content_items (item_id));

diesel::allow_tables_to_appear_in_same_query!(content_items, view_counters, ratings, follow_edges);
