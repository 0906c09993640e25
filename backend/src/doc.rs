//! OpenAPI documentation for the feed REST API.
//!
//! [`ApiDoc`] registers the feed, engagement and health endpoints together
//! with the schema wrappers from [`crate::inbound::http::schemas`]. Swagger UI
//! serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::inbound::http::engagement::{
    FollowResponse, RatingRequest, RatingResponse, ViewResponse,
};
use crate::inbound::http::feed::FeedItemResponse;
use crate::inbound::http::schemas::{
    ErrorCodeSchema, ErrorSchema, FeedPageSchema, PaginationLinksSchema,
};

/// Registers the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie carrying the viewer id, issued by the identity service.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Feed backend API",
        description = "Cursor-paginated content feeds with engagement signals."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::feed::get_feed,
        crate::inbound::http::feed::get_item,
        crate::inbound::http::engagement::record_view,
        crate::inbound::http::engagement::rate_item,
        crate::inbound::http::engagement::follow_user,
        crate::inbound::http::engagement::unfollow_user,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        FeedItemResponse,
        FeedPageSchema,
        PaginationLinksSchema,
        RatingRequest,
        RatingResponse,
        ViewResponse,
        FollowResponse,
        ErrorSchema,
        ErrorCodeSchema
    )),
    tags(
        (name = "feed", description = "Feed pages and single items"),
        (name = "engagement", description = "Views, ratings and follows"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    fn object_fields(schema: &RefOr<Schema>) -> Vec<String> {
        match schema {
            RefOr::T(Schema::Object(obj)) => obj.properties.keys().cloned().collect(),
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/feed")]
    #[case("/api/v1/items/{item_id}")]
    #[case("/api/v1/items/{item_id}/views")]
    #[case("/api/v1/items/{item_id}/rating")]
    #[case("/api/v1/users/{user_id}/follow")]
    #[case("/health/ready")]
    fn documents_every_endpoint(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing {path}");
    }

    #[rstest]
    fn feed_page_schema_uses_camel_case_envelope() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let fields = object_fields(schemas.get("FeedPage").expect("FeedPage schema"));
        for field in ["data", "limit", "nextCursor", "links"] {
            assert!(fields.iter().any(|name| name == field), "missing {field}");
        }
    }

    #[rstest]
    fn item_schema_exposes_statistics() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let fields = object_fields(schemas.get("FeedItemResponse").expect("item schema"));
        for field in ["viewCount", "averageRating", "ownerFollowerCount", "updatedAt"] {
            assert!(fields.iter().any(|name| name == field), "missing {field}");
        }
    }
}
