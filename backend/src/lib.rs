//! Cursor-paginated content feed service.
//!
//! The crate is laid out hexagonally: [`domain`] owns feed ordering,
//! relevance scoring and engagement rules, [`inbound`] exposes them over
//! HTTP, and [`outbound`] persists them in memory or PostgreSQL.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
/// Request tracing middleware.
pub use middleware::Trace;
