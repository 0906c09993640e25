//! Grouped engagement queries used by the statistics adapter.
//!
//! Every query is bound to an explicit identifier list so aggregation only
//! touches rows for the page being served.

use std::collections::HashMap;

use diesel::dsl::{count, count_star, sum};
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use super::schema::{follow_edges, ratings, view_counters};
use crate::domain::feed::RatingSummary;

/// Total `seen` per item.
pub(crate) async fn view_totals(
    conn: &mut AsyncPgConnection,
    item_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, i64>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Option<i64>)> = view_counters::table
        .filter(view_counters::item_id.eq_any(item_ids))
        .group_by(view_counters::item_id)
        .select((view_counters::item_id, sum(view_counters::seen)))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(item_id, total)| (item_id, total.unwrap_or_default()))
        .collect())
}

/// Rating count and sum per item.
pub(crate) async fn rating_summaries(
    conn: &mut AsyncPgConnection,
    item_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, RatingSummary>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64, Option<i64>)> = ratings::table
        .filter(ratings::item_id.eq_any(item_ids))
        .group_by(ratings::item_id)
        .select((
            ratings::item_id,
            count(ratings::rating),
            sum(ratings::rating),
        ))
        .load(conn)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(item_id, count, total)| {
            (
                item_id,
                RatingSummary {
                    count,
                    sum: total.unwrap_or_default(),
                },
            )
        })
        .collect())
}

/// Follower count per followed user.
pub(crate) async fn follower_counts(
    conn: &mut AsyncPgConnection,
    user_ids: &[Uuid],
) -> QueryResult<HashMap<Uuid, i64>> {
    if user_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, i64)> = follow_edges::table
        .filter(follow_edges::followed_id.eq_any(user_ids))
        .group_by(follow_edges::followed_id)
        .select((follow_edges::followed_id, count_star()))
        .load(conn)
        .await?;
    Ok(rows.into_iter().collect())
}
