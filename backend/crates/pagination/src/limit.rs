//! Validated page sizes.

use serde::Serialize;

/// Smallest page a caller may request.
pub const MIN_PAGE_LIMIT: u16 = 1;
/// Largest page a caller may request.
pub const MAX_PAGE_LIMIT: u16 = 100;
/// Page size used when the caller does not supply one.
pub const DEFAULT_PAGE_LIMIT: u16 = 20;

/// Raised when a requested page size falls outside
/// [`MIN_PAGE_LIMIT`]..=[`MAX_PAGE_LIMIT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("page limit {value} is outside the accepted range {min}..={max}")]
pub struct PageLimitError {
    /// The rejected value.
    pub value: i64,
    /// Inclusive lower bound.
    pub min: u16,
    /// Inclusive upper bound.
    pub max: u16,
}

/// Page size guaranteed to lie within the accepted range.
///
/// Out-of-range values are rejected rather than clamped so that calling code
/// with a bad limit fails loudly.
///
/// # Examples
///
/// ```
/// use pagination::{MAX_PAGE_LIMIT, PageLimit};
///
/// let limit = PageLimit::new(25).expect("in range");
/// assert_eq!(limit.get(), 25);
/// assert_eq!(limit.lookahead(), 26);
/// assert!(PageLimit::new(i64::from(MAX_PAGE_LIMIT) + 1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PageLimit(u16);

impl PageLimit {
    /// Validate `value` as a page size.
    ///
    /// # Errors
    ///
    /// Returns [`PageLimitError`] when `value` is below [`MIN_PAGE_LIMIT`] or
    /// above [`MAX_PAGE_LIMIT`].
    pub fn new(value: i64) -> Result<Self, PageLimitError> {
        let out_of_range = PageLimitError {
            value,
            min: MIN_PAGE_LIMIT,
            max: MAX_PAGE_LIMIT,
        };
        let narrowed = u16::try_from(value).map_err(|_| out_of_range)?;
        if (MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&narrowed) {
            Ok(Self(narrowed))
        } else {
            Err(out_of_range)
        }
    }

    /// Validate an optional value, falling back to [`DEFAULT_PAGE_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`PageLimitError`] when a supplied value is out of range.
    pub fn from_optional(value: Option<i64>) -> Result<Self, PageLimitError> {
        value.map_or_else(|| Ok(Self::default()), Self::new)
    }

    /// The validated page size.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// The page size as a collection length.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::from(self.0)
    }

    /// Number of rows to fetch so that one extra row reveals whether another
    /// page exists.
    #[must_use]
    pub fn lookahead(self) -> usize {
        self.as_usize().saturating_add(1)
    }
}

impl Default for PageLimit {
    fn default() -> Self {
        Self(DEFAULT_PAGE_LIMIT)
    }
}

impl TryFrom<i64> for PageLimit {
    type Error = PageLimitError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PageLimit> for u16 {
    fn from(value: PageLimit) -> Self {
        value.0
    }
}
