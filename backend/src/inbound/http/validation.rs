//! Shared validation helpers for inbound HTTP adapters.

use pagination::{PageLimit, PageLimitError};
use serde_json::json;
use uuid::Uuid;

use crate::domain::Error;
use crate::domain::engagement::RatingValidationError;
use crate::domain::feed::{FeedMode, FeedModeParseError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    MissingField,
    InvalidUuid,
    InvalidLimit,
    InvalidMode,
    InvalidRating,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingField => "missing_field",
            ErrorCode::InvalidUuid => "invalid_uuid",
            ErrorCode::InvalidLimit => "invalid_limit",
            ErrorCode::InvalidMode => "invalid_mode",
            ErrorCode::InvalidRating => "invalid_rating",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(&self) -> &str {
        self.0
    }
}

/// Builder for validation errors with field context.
struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    fn with_code(self, code: ErrorCode) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "code": code.as_str(),
        }))
    }

    fn with_value(self, code: ErrorCode, value: impl Into<String>) -> Error {
        Error::invalid_request(self.message).with_details(json!({
            "field": self.field,
            "value": value.into(),
            "code": code.as_str(),
        }))
    }
}

pub(crate) fn missing_field_error(field: FieldName) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("missing required field: {field}"))
        .with_code(ErrorCode::MissingField)
}

pub(crate) fn invalid_uuid_error(field: FieldName, value: &str) -> Error {
    let field = field.as_str();
    ValidationError::new(field, format!("{field} must be a valid UUID"))
        .with_value(ErrorCode::InvalidUuid, value)
}

pub(crate) fn parse_uuid(value: &str, field: FieldName) -> Result<Uuid, Error> {
    Uuid::parse_str(value).map_err(|_| invalid_uuid_error(field, value))
}

/// Parse an optional UUID query parameter; blank values count as absent.
pub(crate) fn parse_optional_uuid(
    value: Option<&str>,
    field: FieldName,
) -> Result<Option<Uuid>, Error> {
    value
        .filter(|raw| !raw.trim().is_empty())
        .map(|raw| parse_uuid(raw, field))
        .transpose()
}

fn invalid_limit_error(value: &str, message: String) -> Error {
    ValidationError::new("limit", message).with_value(ErrorCode::InvalidLimit, value)
}

/// Validate the `limit` query parameter, falling back to `default` when it is
/// omitted. Out-of-range values are rejected rather than clamped.
pub(crate) fn parse_limit(value: Option<&str>, default: PageLimit) -> Result<PageLimit, Error> {
    let Some(raw) = value else {
        return Ok(default);
    };
    let requested: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid_limit_error(raw, "limit must be an integer".to_owned()))?;
    PageLimit::new(requested)
        .map_err(|PageLimitError { min, max, .. }| {
            invalid_limit_error(raw, format!("limit must be between {min} and {max}"))
        })
}

/// Parse the feed `mode` query parameter; absent means recency.
pub(crate) fn parse_mode(value: Option<&str>) -> Result<FeedMode, Error> {
    value.map_or(Ok(FeedMode::default()), |raw| {
        raw.parse().map_err(|err: FeedModeParseError| {
            ValidationError::new("mode", err.to_string()).with_value(ErrorCode::InvalidMode, raw)
        })
    })
}

pub(crate) fn invalid_rating_error(err: RatingValidationError, value: i64) -> Error {
    ValidationError::new("rating", err.to_string())
        .with_value(ErrorCode::InvalidRating, value.to_string())
}
