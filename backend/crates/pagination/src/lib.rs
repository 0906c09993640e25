//! Shared pagination primitives for cursor-based feed endpoints.
//!
//! The crate is storage and transport agnostic. It knows how to:
//!
//! - turn any serialisable sort key into an opaque, URL-safe [`Cursor`] token
//!   and back again without losing precision;
//! - validate caller supplied page sizes into a [`PageLimit`] without silently
//!   clamping them;
//! - wrap a page of results in a [`Paginated`] envelope carrying the next
//!   cursor and navigation links.
//!
//! Ordering, resume predicates, and the meaning of the key live with the
//! caller. This crate only guarantees that what goes into a cursor comes back
//! out unchanged.

mod cursor;
mod envelope;
mod limit;

pub use cursor::{Cursor, CursorError, MAX_CURSOR_TOKEN_LEN};
pub use envelope::{CURSOR_QUERY_PARAM, LIMIT_QUERY_PARAM, Paginated, PaginationLinks};
pub use limit::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, MIN_PAGE_LIMIT, PageLimit, PageLimitError};
