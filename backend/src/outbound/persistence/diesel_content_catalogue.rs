//! PostgreSQL-backed `ContentCatalogue` implementation using Diesel ORM.
//!
//! Feed predicates and the recency resume position compile to a single
//! `WHERE` clause ordered by `(updated_at DESC, id DESC)` so the partial
//! `content_items_feed_order_idx` index serves the recency feed directly.
//!
//! Text search computes the relevance score in SQL, joining per-item view and
//! rating totals laterally, so the resume predicate, ordering and `LIMIT` all
//! run in the database and only the lookahead window is returned. Tokens are
//! split on non-`[:alnum:]` runs and lowercased by the database; for ASCII
//! text this agrees exactly with the domain tokenizer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Array, BigInt, Bool, Double, Text, Timestamptz};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::feed::{
    CategoryId, ContentItem, ContentItemId, DESCRIPTION_MATCH_WEIGHT, FeedPredicate,
    PARTIAL_TITLE_MATCH_WEIGHT, ProcessingStatus, RelevanceScore, SearchQuery,
    TITLE_MATCH_WEIGHT, VIEWS_PER_POPULARITY_POINT, Visibility,
};
use crate::domain::ports::{
    ContentCatalogue, ContentCatalogueError, RecentItemsRequest, ScoredItem, SearchOrder,
    SearchPageRequest,
};

use super::diesel_helpers::{contains_pattern, limit_to_i64, map_diesel_error, map_pool_error};
use super::models::{ContentItemRow, ScoredItemRow};
use super::pool::{DbPool, PoolError};
use super::schema::content_items;

type ItemQuery<'a> = content_items::BoxedQuery<'a, Pg>;
type ItemCondition = Box<dyn BoxableExpression<content_items::table, Pg, SqlType = Bool>>;

/// Diesel-backed implementation of the `ContentCatalogue` port.
#[derive(Clone)]
pub struct DieselContentCatalogue {
    pool: DbPool,
}

impl DieselContentCatalogue {
    /// Create a new catalogue with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ContentCatalogueError {
    map_pool_error(error, ContentCatalogueError::connection)
}

fn diesel_error(error: diesel::result::Error) -> ContentCatalogueError {
    map_diesel_error(
        error,
        ContentCatalogueError::query,
        ContentCatalogueError::connection,
    )
}

/// `title ILIKE %needle% OR description ILIKE %needle%`.
fn mentions_needle(needle: &str) -> ItemCondition {
    let pattern = contains_pattern(needle);
    Box::new(
        content_items::title
            .ilike(pattern.clone())
            .or(content_items::description.ilike(pattern)),
    )
}

/// Matches the phrase or any term, mirroring [`SearchQuery::is_mentioned_in`].
fn mentions_query(query: &SearchQuery) -> ItemCondition {
    query
        .terms()
        .iter()
        .filter(|term| term.as_str() != query.phrase())
        .fold(mentions_needle(query.phrase()), |condition, term| {
            Box::new(condition.or(mentions_needle(term)))
        })
}

fn apply_predicate<'a>(query: ItemQuery<'a>, predicate: &FeedPredicate) -> ItemQuery<'a> {
    match predicate {
        FeedPredicate::PublicVisibility => {
            query.filter(content_items::visibility.eq(Visibility::Public.as_str()))
        }
        FeedPredicate::ProcessingCompleted => {
            query.filter(content_items::status.eq(ProcessingStatus::Completed.as_str()))
        }
        FeedPredicate::InCategory(category_id) => {
            query.filter(content_items::category_id.eq(*category_id.as_uuid()))
        }
        FeedPredicate::OwnedBy(owner_id) => {
            query.filter(content_items::owner_id.eq(*owner_id.as_uuid()))
        }
        FeedPredicate::MentionsText(search) => query.filter(mentions_query(search)),
    }
}

fn filtered<'a>(predicates: &[FeedPredicate]) -> ItemQuery<'a> {
    predicates
        .iter()
        .fold(content_items::table.into_boxed(), |query, predicate| {
            apply_predicate(query, predicate)
        })
}

/// Resume position bound into a search statement.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchResume {
    Score(f64, Uuid),
    UpdatedAt(DateTime<Utc>, Uuid),
}

/// A search query rendered to SQL, with the values its placeholders expect.
///
/// `$1` holds the query terms, `$2` the phrase and `$3` the row limit; the
/// optional binds follow in field order.
#[derive(Debug, Clone, PartialEq)]
struct SearchStatement {
    sql: String,
    category_id: Option<Uuid>,
    owner_id: Option<Uuid>,
    resume: Option<SearchResume>,
}

/// Pin an equality filter to a single value; a second, different value for
/// the same column can match nothing.
fn restrict(slot: &mut Option<Uuid>, value: Uuid, conflicts: &mut bool) -> bool {
    match *slot {
        None => {
            *slot = Some(value);
            true
        }
        Some(existing) => {
            *conflicts |= existing != value;
            false
        }
    }
}

impl SearchStatement {
    fn build(request: &SearchPageRequest) -> Self {
        let mut next_param = 4;
        let mut param = || {
            let placeholder = format!("${next_param}");
            next_param += 1;
            placeholder
        };

        let mut conditions = Vec::new();
        let mut category_id = None;
        let mut owner_id = None;
        let mut conflicts = false;
        for predicate in &request.predicates {
            match predicate {
                FeedPredicate::PublicVisibility => conditions.push(format!(
                    "c.visibility = '{}'",
                    Visibility::Public.as_str()
                )),
                FeedPredicate::ProcessingCompleted => conditions.push(format!(
                    "c.status = '{}'",
                    ProcessingStatus::Completed.as_str()
                )),
                FeedPredicate::InCategory(category) => {
                    if restrict(&mut category_id, *category.as_uuid(), &mut conflicts) {
                        conditions.push(format!("c.category_id = {}::uuid", param()));
                    }
                }
                FeedPredicate::OwnedBy(owner) => {
                    if restrict(&mut owner_id, *owner.as_uuid(), &mut conflicts) {
                        conditions.push(format!("c.owner_id = {}::uuid", param()));
                    }
                }
                // Subsumed by the text-match requirement on the request query.
                FeedPredicate::MentionsText(_) => {}
            }
        }
        if conflicts {
            conditions.push("FALSE".to_owned());
        }
        let filters = if conditions.is_empty() {
            "TRUE".to_owned()
        } else {
            conditions.join(" AND ")
        };

        let (resume, order_by) = match request.order {
            SearchOrder::Relevance { after } => (
                after.map(|position| {
                    SearchResume::Score(position.key.value(), *position.id.as_uuid())
                }),
                "score DESC, id DESC",
            ),
            SearchOrder::Recency { after } => (
                after.map(|position| SearchResume::UpdatedAt(position.key, *position.id.as_uuid())),
                "updated_at DESC, id DESC",
            ),
        };
        let resume_filter = match resume {
            None => "TRUE".to_owned(),
            Some(SearchResume::Score(..)) => {
                format!("(score, id) < ({}::float8, {}::uuid)", param(), param())
            }
            Some(SearchResume::UpdatedAt(..)) => {
                format!("(updated_at, id) < ({}::timestamptz, {}::uuid)", param(), param())
            }
        };

        Self {
            sql: scored_search_sql(&filters, &resume_filter, order_by),
            category_id,
            owner_id,
            resume,
        }
    }
}

/// Text components mirror `TextMatch`; popularity adds views per point plus
/// the mean rating, summed in the same order as the domain scorer so both
/// produce identical doubles.
fn scored_search_sql(filters: &str, resume_filter: &str, order_by: &str) -> String {
    format!(
        r#"
WITH matched AS (
    SELECT c.*,
        (cardinality($1::text[]) > 0 AND c.title <> ''
            AND regexp_split_to_array(lower(c.title), '[^[:alnum:]]+') @> $1::text[]) AS title_match,
        (cardinality($1::text[]) > 0 AND c.description <> ''
            AND regexp_split_to_array(lower(c.description), '[^[:alnum:]]+') @> $1::text[]) AS description_match,
        (c.title <> '' AND (strpos(lower(c.title), $2::text) > 0
            OR EXISTS (SELECT 1 FROM unnest($1::text[]) AS term WHERE strpos(lower(c.title), term) > 0))) AS partial_title_match
    FROM content_items c
    WHERE {filters}
),
scored AS (
    SELECT m.id, m.owner_id, m.visibility, m.status, m.category_id, m.title, m.description,
        m.created_at, m.updated_at,
        (CASE WHEN m.title_match THEN {TITLE_MATCH_WEIGHT} ELSE 0 END
            + CASE WHEN m.description_match THEN {DESCRIPTION_MATCH_WEIGHT} ELSE 0 END
            + CASE WHEN m.partial_title_match THEN {PARTIAL_TITLE_MATCH_WEIGHT} ELSE 0 END)::float8
        + (COALESCE(v.total, 0)::float8 / {VIEWS_PER_POPULARITY_POINT}::float8
            + CASE WHEN r.rating_count > 0
                THEN r.rating_sum::float8 / r.rating_count::float8
                ELSE 0::float8 END) AS score
    FROM matched m
    LEFT JOIN LATERAL (
        SELECT SUM(vc.seen) AS total FROM view_counters vc WHERE vc.item_id = m.id
    ) v ON TRUE
    LEFT JOIN LATERAL (
        SELECT COUNT(*) AS rating_count, SUM(rt.rating) AS rating_sum
        FROM ratings rt WHERE rt.item_id = m.id
    ) r ON TRUE
    WHERE m.title_match OR m.description_match OR m.partial_title_match
)
SELECT id, owner_id, visibility, status, category_id, title, description,
    created_at, updated_at, score
FROM scored
WHERE {resume_filter}
ORDER BY {order_by}
LIMIT $3
"#
    )
}

/// Convert a database row to a domain content item.
fn row_to_item(row: ContentItemRow) -> Result<ContentItem, ContentCatalogueError> {
    let visibility = row
        .visibility
        .parse::<Visibility>()
        .map_err(|err| ContentCatalogueError::query(err.to_string()))?;
    let status = row
        .status
        .parse::<ProcessingStatus>()
        .map_err(|err| ContentCatalogueError::query(err.to_string()))?;
    let non_empty = |text: String| (!text.is_empty()).then_some(text);
    Ok(ContentItem {
        id: ContentItemId::from_uuid(row.id),
        owner_id: UserId::from_uuid(row.owner_id),
        visibility,
        status,
        category_id: row.category_id.map(CategoryId::from_uuid),
        title: non_empty(row.title),
        description: non_empty(row.description),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[async_trait]
impl ContentCatalogue for DieselContentCatalogue {
    async fn fetch_recent(
        &self,
        request: &RecentItemsRequest,
    ) -> Result<Vec<ContentItem>, ContentCatalogueError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let mut query = filtered(&request.predicates);
        if let Some(after) = &request.after {
            let (key, id) = (after.key, *after.id.as_uuid());
            query = query.filter(
                content_items::updated_at
                    .lt(key)
                    .or(content_items::updated_at.eq(key).and(content_items::id.lt(id))),
            );
        }

        let rows: Vec<ContentItemRow> = query
            .order((content_items::updated_at.desc(), content_items::id.desc()))
            .limit(limit_to_i64(request.limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter().map(row_to_item).collect()
    }

    async fn search_page(
        &self,
        request: &SearchPageRequest,
    ) -> Result<Vec<ScoredItem>, ContentCatalogueError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let statement = SearchStatement::build(request);
        let mut query = sql_query(statement.sql)
            .into_boxed::<Pg>()
            .bind::<Array<Text>, _>(request.query.terms().to_vec())
            .bind::<Text, _>(request.query.phrase().to_owned())
            .bind::<BigInt, _>(limit_to_i64(request.limit));
        if let Some(category_id) = statement.category_id {
            query = query.bind::<diesel::sql_types::Uuid, _>(category_id);
        }
        if let Some(owner_id) = statement.owner_id {
            query = query.bind::<diesel::sql_types::Uuid, _>(owner_id);
        }
        query = match statement.resume {
            None => query,
            Some(SearchResume::Score(score, id)) => query
                .bind::<Double, _>(score)
                .bind::<diesel::sql_types::Uuid, _>(id),
            Some(SearchResume::UpdatedAt(updated_at, id)) => query
                .bind::<Timestamptz, _>(updated_at)
                .bind::<diesel::sql_types::Uuid, _>(id),
        };

        let rows: Vec<ScoredItemRow> = query.load(&mut conn).await.map_err(diesel_error)?;

        rows.into_iter()
            .map(|row| {
                row_to_item(row.item).map(|item| ScoredItem {
                    item,
                    score: RelevanceScore::new(row.score),
                })
            })
            .collect()
    }

    async fn find_item(
        &self,
        item_id: &ContentItemId,
    ) -> Result<Option<ContentItem>, ContentCatalogueError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let row: Option<ContentItemRow> = content_items::table
            .find(*item_id.as_uuid())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;

        row.map(row_to_item).transpose()
    }
}
