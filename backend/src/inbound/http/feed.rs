//! Feed read HTTP handlers.
//!
//! ```text
//! GET /api/v1/feed?mode=recency|relevance&q=&category=&owner=&cursor=&limit=
//! GET /api/v1/items/{item_id}
//! ```

use actix_web::{HttpRequest, get, web};
use chrono::{DateTime, Utc};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::feed::{CategoryId, ContentItemId, FeedFilters, SearchQuery};
use crate::domain::ports::{FeedEntry, FeedPageRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, FeedPageSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_limit, parse_mode, parse_optional_uuid, parse_uuid,
};

/// Query parameters accepted by the feed endpoint.
///
/// Every parameter is optional. Values are parsed by the handler so invalid
/// input produces the shared error envelope instead of a framework error.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FeedParams {
    /// `recency` (default) or `relevance`.
    pub mode: Option<String>,
    /// Free-text query matched against titles and descriptions.
    pub q: Option<String>,
    /// Restrict to one category.
    pub category: Option<String>,
    /// Restrict to one owner's items.
    pub owner: Option<String>,
    /// Opaque cursor returned with the previous page.
    pub cursor: Option<String>,
    /// Page size in `1..=100`; defaults to the configured page size.
    pub limit: Option<String>,
}

impl FeedParams {
    fn filters(&self, viewer_id: Option<UserId>) -> ApiResult<FeedFilters> {
        let category = parse_optional_uuid(self.category.as_deref(), FieldName::new("category"))?;
        let owner = parse_optional_uuid(self.owner.as_deref(), FieldName::new("owner"))?;
        Ok(FeedFilters {
            mode: parse_mode(self.mode.as_deref())?,
            query: self.q.as_deref().and_then(SearchQuery::parse),
            category_id: category.map(CategoryId::from_uuid),
            owner_id: owner.map(UserId::from_uuid),
            viewer_id,
        })
    }
}

/// One feed entry as returned to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    /// Item identifier.
    pub id: Uuid,
    /// Owning user.
    pub owner_id: Uuid,
    /// Category, when assigned.
    pub category_id: Option<Uuid>,
    /// Item title.
    pub title: Option<String>,
    /// Item description.
    pub description: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time; the recency sort key.
    pub updated_at: DateTime<Utc>,
    /// Total views across all viewers.
    pub view_count: i64,
    /// Number of ratings.
    pub rating_count: i64,
    /// Mean rating, `0` when unrated.
    pub average_rating: f64,
    /// Followers of the owner.
    pub owner_follower_count: i64,
    /// Whether the viewer follows the owner; absent for anonymous viewers.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub viewer_is_following_owner: Option<bool>,
    /// The viewer's own rating.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub viewer_rating: Option<u8>,
    /// Relevance score for text-search feeds.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
}

impl From<FeedEntry> for FeedItemResponse {
    fn from(entry: FeedEntry) -> Self {
        let FeedEntry {
            item,
            statistics,
            score,
        } = entry;
        Self {
            id: *item.id.as_uuid(),
            owner_id: *item.owner_id.as_uuid(),
            category_id: item.category_id.map(|id| *id.as_uuid()),
            title: item.title,
            description: item.description,
            created_at: item.created_at,
            updated_at: item.updated_at,
            view_count: statistics.view_count,
            rating_count: statistics.rating_count,
            average_rating: statistics.average_rating,
            owner_follower_count: statistics.owner_follower_count,
            viewer_is_following_owner: statistics.viewer_is_following_owner,
            viewer_rating: statistics.viewer_rating.map(|rating| rating.get()),
            score: score.map(|score| score.value()),
        }
    }
}

/// Fetch one page of the content feed.
///
/// A malformed or stale `cursor` restarts the feed from the first page.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(FeedParams),
    responses(
        (status = 200, description = "One page of the feed", body = FeedPageSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["feed"],
    operation_id = "getFeed",
    security((), ("SessionCookie" = []))
)]
#[get("/feed")]
pub async fn get_feed(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    params: web::Query<FeedParams>,
) -> ApiResult<web::Json<Paginated<FeedItemResponse>>> {
    let viewer_id = session.user_id()?;
    let params = params.into_inner();
    let limit = parse_limit(params.limit.as_deref(), state.default_limit)?;
    let page_request = FeedPageRequest {
        filters: params.filters(viewer_id)?,
        cursor: params.cursor,
        limit,
    };

    let page = state.feed.fetch_page(&page_request).await?;
    let data = page
        .entries
        .into_iter()
        .map(FeedItemResponse::from)
        .collect();
    Ok(web::Json(Paginated::new(
        data,
        limit,
        page.next_cursor,
        &request.full_url(),
    )))
}

/// Fetch a single content item with its statistics.
#[utoipa::path(
    get,
    path = "/api/v1/items/{item_id}",
    params(("item_id" = Uuid, Path, description = "Content item identifier")),
    responses(
        (status = 200, description = "The item", body = FeedItemResponse),
        (status = 400, description = "Invalid item id", body = ErrorSchema),
        (status = 404, description = "Item not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["feed"],
    operation_id = "getItem",
    security((), ("SessionCookie" = []))
)]
#[get("/items/{item_id}")]
pub async fn get_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FeedItemResponse>> {
    let viewer_id = session.user_id()?;
    let item_id = ContentItemId::from_uuid(parse_uuid(&path, FieldName::new("itemId"))?);
    let entry = state.feed.fetch_item(&item_id, viewer_id).await?;
    Ok(web::Json(FeedItemResponse::from(entry)))
}

#[cfg(test)]
#[path = "feed_tests.rs"]
mod tests;
