//! OpenAPI schema definitions for domain and pagination types.
//!
//! Domain types and the pagination envelope stay framework-agnostic by not
//! deriving `ToSchema`. The wrappers here mirror their wire shape so utoipa can
//! document them from the inbound adapter layer.

use utoipa::ToSchema;

use crate::inbound::http::feed::FeedItemResponse;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
///
/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Authentication failed or is missing.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// Authenticated but not permitted to perform this action.
    #[schema(rename = "forbidden")]
    Forbidden,
    /// The requested resource does not exist.
    #[schema(rename = "not_found")]
    NotFound,
    /// The request conflicts with the current state of the resource.
    #[schema(rename = "conflict")]
    Conflict,
    /// A backing store is temporarily unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    /// An unexpected error occurred on the server.
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// API error response payload with machine-readable code and human-readable
/// message.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    /// Stable machine-readable error code.
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    /// Human-readable message returned to clients.
    #[schema(example = "limit must be between 1 and 100")]
    message: String,
    /// Correlation identifier for tracing this error across systems.
    #[schema(rename = "traceId", example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    /// Supplementary error details such as the offending field.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for `pagination::PaginationLinks`.
#[derive(ToSchema)]
#[schema(as = PaginationLinks)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaginationLinksSchema {
    /// The request that produced this page.
    #[schema(rename = "self")]
    current: String,
    /// The request for the following page; absent on the last page.
    next: Option<String>,
}

/// OpenAPI schema for `pagination::Paginated<FeedItemResponse>`.
#[derive(ToSchema)]
#[schema(as = FeedPage)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct FeedPageSchema {
    /// Items in feed order.
    data: Vec<FeedItemResponse>,
    /// The page size applied.
    #[schema(example = 20)]
    limit: u16,
    /// Opaque cursor for the following page; `null` on the last page.
    #[schema(rename = "nextCursor")]
    next_cursor: Option<String>,
    /// Navigation links.
    links: PaginationLinksSchema,
}
