//! Paged response envelope.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::PageLimit;

/// Query parameter carrying the resume cursor.
pub const CURSOR_QUERY_PARAM: &str = "cursor";
/// Query parameter carrying the requested page size.
pub const LIMIT_QUERY_PARAM: &str = "limit";

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLinks {
    /// The request that produced this page.
    #[serde(rename = "self")]
    pub current: String,
    /// The request that produces the following page, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub next: Option<String>,
}

impl PaginationLinks {
    /// Derive links from the request URL and the next cursor.
    ///
    /// The `next` link preserves every query parameter of `request` except the
    /// cursor and limit, which are replaced with `next_cursor` and `limit`.
    #[must_use]
    pub fn from_request(request: &Url, limit: PageLimit, next_cursor: Option<&str>) -> Self {
        let next = next_cursor.map(|cursor| {
            let retained: Vec<(String, String)> = request
                .query_pairs()
                .filter(|(name, _)| name != CURSOR_QUERY_PARAM && name != LIMIT_QUERY_PARAM)
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect();
            let mut next_url = request.clone();
            next_url
                .query_pairs_mut()
                .clear()
                .extend_pairs(retained)
                .append_pair(LIMIT_QUERY_PARAM, &limit.get().to_string())
                .append_pair(CURSOR_QUERY_PARAM, cursor);
            next_url.to_string()
        });
        Self {
            current: request.to_string(),
            next,
        }
    }
}

/// A page of results and the cursor that resumes after it.
///
/// # Examples
///
/// ```
/// use pagination::{PageLimit, Paginated};
/// use url::Url;
///
/// let request = Url::parse("https://feed.test/api/v1/feed?mode=recency").expect("url");
/// let limit = PageLimit::new(2).expect("limit");
/// let page = Paginated::new(vec![1, 2], limit, Some("abc".to_owned()), &request);
/// assert_eq!(page.next_cursor.as_deref(), Some("abc"));
/// assert!(page.links.next.expect("next link").contains("cursor=abc"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items on this page, in feed order.
    pub data: Vec<T>,
    /// The page size the caller asked for.
    pub limit: u16,
    /// Opaque cursor for the following page; `None` on the last page.
    pub next_cursor: Option<String>,
    /// Navigation links.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Assemble an envelope for `data`.
    #[must_use]
    pub fn new(data: Vec<T>, limit: PageLimit, next_cursor: Option<String>, request: &Url) -> Self {
        let links = PaginationLinks::from_request(request, limit, next_cursor.as_deref());
        Self {
            data,
            limit: limit.get(),
            next_cursor,
            links,
        }
    }

    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }

    /// Transform each item while keeping the paging metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            next_cursor: self.next_cursor,
            links: self.links,
        }
    }
}
