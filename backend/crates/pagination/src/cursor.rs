//! Opaque cursor codec.
//!
//! A cursor is the JSON serialisation of a caller-defined key, encoded with
//! unpadded URL-safe base64 so it can travel in query strings untouched.
//! Decoding tolerates unknown fields in the payload, so a token minted by an
//! older key schema that carried extra fields still decodes under a newer one.
//!
//! Floating-point keys decode to the exact bits they were encoded from; the
//! crate enables serde_json's `float_roundtrip` parser for that.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Upper bound on accepted token length.
///
/// Cursors are untrusted input; anything longer than this cannot have been
/// produced by a feed key and is rejected before base64 decoding.
pub const MAX_CURSOR_TOKEN_LEN: usize = 1024;

/// Failures raised while encoding or decoding a [`Cursor`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CursorError {
    /// The token was empty or whitespace.
    #[error("cursor token is empty")]
    Empty,
    /// The token exceeded [`MAX_CURSOR_TOKEN_LEN`].
    #[error("cursor token exceeds {max} characters")]
    TooLong {
        /// Maximum accepted token length.
        max: usize,
    },
    /// The token was not valid unpadded base64url.
    #[error("cursor token is not valid base64url: {message}")]
    Encoding {
        /// Decoder diagnostic.
        message: String,
    },
    /// The decoded payload did not match the expected key shape.
    #[error("cursor payload is malformed: {message}")]
    Payload {
        /// Deserialiser diagnostic.
        message: String,
    },
    /// The key could not be serialised.
    #[error("cursor key could not be serialised: {message}")]
    Serialize {
        /// Serialiser diagnostic.
        message: String,
    },
}

/// Opaque resume position wrapping a serialisable key.
///
/// # Examples
///
/// ```
/// use pagination::Cursor;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct Key {
///     at: i64,
///     id: String,
/// }
///
/// let cursor = Cursor::new(Key { at: 42, id: "a".to_owned() });
/// let token = cursor.encode().expect("key serialises");
/// let decoded = Cursor::<Key>::decode(&token).expect("token decodes");
/// assert_eq!(decoded, cursor);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor<K> {
    key: K,
}

impl<K> Cursor<K> {
    /// Wrap `key` in a cursor.
    #[must_use]
    pub const fn new(key: K) -> Self {
        Self { key }
    }

    /// Borrow the key.
    #[must_use]
    pub const fn key(&self) -> &K {
        &self.key
    }

    /// Consume the cursor, returning the key.
    #[must_use]
    pub fn into_inner(self) -> K {
        self.key
    }
}

impl<K: Serialize> Cursor<K> {
    /// Encode the key as an opaque token.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::Serialize`] when the key cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn encode(&self) -> Result<String, CursorError> {
        let payload = serde_json::to_vec(&self.key).map_err(|err| CursorError::Serialize {
            message: err.to_string(),
        })?;
        Ok(URL_SAFE_NO_PAD.encode(payload))
    }
}

impl<K: DeserializeOwned> Cursor<K> {
    /// Decode a token produced by [`Cursor::encode`].
    ///
    /// # Errors
    ///
    /// Returns a [`CursorError`] describing why the token could not be turned
    /// back into a key. Callers are expected to treat every variant the same
    /// way: as an absent cursor.
    pub fn decode(token: &str) -> Result<Self, CursorError> {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(CursorError::Empty);
        }
        if trimmed.len() > MAX_CURSOR_TOKEN_LEN {
            return Err(CursorError::TooLong {
                max: MAX_CURSOR_TOKEN_LEN,
            });
        }
        let payload = URL_SAFE_NO_PAD
            .decode(trimmed)
            .map_err(|err| CursorError::Encoding {
                message: err.to_string(),
            })?;
        let key = serde_json::from_slice(&payload).map_err(|err| CursorError::Payload {
            message: err.to_string(),
        })?;
        Ok(Self { key })
    }
}
