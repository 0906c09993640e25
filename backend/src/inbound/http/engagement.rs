//! Engagement write HTTP handlers.
//!
//! ```text
//! POST   /api/v1/items/{item_id}/views
//! PUT    /api/v1/items/{item_id}/rating   {"rating": 4}
//! PUT    /api/v1/users/{user_id}/follow
//! DELETE /api/v1/users/{user_id}/follow
//! ```
//!
//! Every endpoint requires a viewer session. Rate-limited writes succeed with
//! `recorded: false` rather than failing.

use actix_web::{delete, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::UserId;
use crate::domain::engagement::{FollowOutcome, Rating, RatingOutcome, ViewOutcome};
use crate::domain::feed::ContentItemId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_rating_error, missing_field_error, parse_uuid,
};

/// Request payload for rating an item.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    /// Integer rating in `1..=5`.
    #[schema(example = 4)]
    pub rating: Option<i64>,
}

/// Response payload for a view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewResponse {
    /// Viewed item.
    pub item_id: Uuid,
    /// The viewer's counted views.
    pub seen: i32,
    /// Whether this request was counted.
    pub recorded: bool,
}

impl From<ViewOutcome> for ViewResponse {
    fn from(value: ViewOutcome) -> Self {
        Self {
            item_id: *value.item_id.as_uuid(),
            seen: value.seen,
            recorded: value.recorded,
        }
    }
}

/// Response payload for a rating.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingResponse {
    /// Rated item.
    pub item_id: Uuid,
    /// The stored rating.
    pub rating: u8,
    /// Whether this request changed the stored rating.
    pub recorded: bool,
}

impl From<RatingOutcome> for RatingResponse {
    fn from(value: RatingOutcome) -> Self {
        Self {
            item_id: *value.item_id.as_uuid(),
            rating: value.rating.get(),
            recorded: value.recorded,
        }
    }
}

/// Response payload for follow and unfollow.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowResponse {
    /// The followed user.
    pub user_id: Uuid,
    /// Whether the viewer follows the user after this request.
    pub following: bool,
    /// Whether this request changed the follow state.
    pub changed: bool,
}

impl From<FollowOutcome> for FollowResponse {
    fn from(value: FollowOutcome) -> Self {
        Self {
            user_id: *value.followed_id.as_uuid(),
            following: value.following,
            changed: value.changed,
        }
    }
}

fn item_id_from(path: &str) -> ApiResult<ContentItemId> {
    parse_uuid(path, FieldName::new("itemId")).map(ContentItemId::from_uuid)
}

fn user_id_from(path: &str) -> ApiResult<UserId> {
    parse_uuid(path, FieldName::new("userId")).map(UserId::from_uuid)
}

fn parse_rating(payload: RatingRequest) -> ApiResult<Rating> {
    let value = payload
        .rating
        .ok_or_else(|| missing_field_error(FieldName::new("rating")))?;
    Rating::new(value).map_err(|err| invalid_rating_error(err, value))
}

/// Record a view of an item by the session viewer.
#[utoipa::path(
    post,
    path = "/api/v1/items/{item_id}/views",
    params(("item_id" = Uuid, Path, description = "Content item identifier")),
    responses(
        (status = 200, description = "View outcome", body = ViewResponse),
        (status = 400, description = "Invalid item id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Item not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "recordView"
)]
#[post("/items/{item_id}/views")]
pub async fn record_view(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ViewResponse>> {
    let viewer_id = session.require_user_id()?;
    let item_id = item_id_from(&path)?;
    let outcome = state.engagement.record_view(&item_id, &viewer_id).await?;
    Ok(web::Json(ViewResponse::from(outcome)))
}

/// Rate an item as the session viewer.
#[utoipa::path(
    put,
    path = "/api/v1/items/{item_id}/rating",
    params(("item_id" = Uuid, Path, description = "Content item identifier")),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating outcome", body = RatingResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Item not found", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "rateItem"
)]
#[put("/items/{item_id}/rating")]
pub async fn rate_item(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RatingRequest>,
) -> ApiResult<web::Json<RatingResponse>> {
    let viewer_id = session.require_user_id()?;
    let item_id = item_id_from(&path)?;
    let rating = parse_rating(payload.into_inner())?;
    let outcome = state
        .engagement
        .rate_item(&item_id, &viewer_id, rating)
        .await?;
    Ok(web::Json(RatingResponse::from(outcome)))
}

/// Follow a user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}/follow",
    params(("user_id" = Uuid, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Follow outcome", body = FollowResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "followUser"
)]
#[put("/users/{user_id}/follow")]
pub async fn follow_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FollowResponse>> {
    let follower_id = session.require_user_id()?;
    let followed_id = user_id_from(&path)?;
    let outcome = state.engagement.follow(&follower_id, &followed_id).await?;
    Ok(web::Json(FollowResponse::from(outcome)))
}

/// Stop following a user.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{user_id}/follow",
    params(("user_id" = Uuid, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Follow outcome", body = FollowResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 503, description = "Service unavailable", body = ErrorSchema)
    ),
    tags = ["engagement"],
    operation_id = "unfollowUser"
)]
#[delete("/users/{user_id}/follow")]
pub async fn unfollow_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<FollowResponse>> {
    let follower_id = session.require_user_id()?;
    let followed_id = user_id_from(&path)?;
    let outcome = state
        .engagement
        .unfollow(&follower_id, &followed_id)
        .await?;
    Ok(web::Json(FollowResponse::from(outcome)))
}

#[cfg(test)]
#[path = "engagement_tests.rs"]
mod tests;
