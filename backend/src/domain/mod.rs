//! Domain primitives, services and ports.
//!
//! Purpose: Define strongly typed domain entities used by the HTTP and
//! persistence adapters. Keep types immutable and document invariants and
//! serialisation contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): domain error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - TraceId (alias to `trace_id::TraceId`): per-request correlation id.
//! - UserId (alias to `user::UserId`): owner and viewer identity.
//! - `feed`: content model, ordering, cursors, relevance and paging.
//! - `engagement`: views, ratings and follow edges.
//! - `ports`: hexagonal boundary traits.

pub mod engagement;
pub mod error;
pub mod feed;
pub mod ports;
pub mod trace_id;
pub mod user;

pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::trace_id::TraceId;
pub use self::user::{UserId, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use feed_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
