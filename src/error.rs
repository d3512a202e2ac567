//! Structured error types for cache construction and access.

use std::fmt;

/// Everything that can go wrong when building or using a [`Cache`](crate::Cache).
///
/// `E` is the loader's own error type; it is carried verbatim in
/// [`CacheError::LoaderFailed`] rather than stringified, so callers get
/// their original error back.
#[derive(Debug, Clone)]
pub enum CacheError<E = std::convert::Infallible> {
    /// The key is absent (or expired) and no loader was engaged.
    NotFound,
    /// The configured loader returned an error.
    LoaderFailed(E),
    /// The configured loader panicked; the in-flight single-flight record
    /// was still cleaned up.
    LoaderPanicked(String),
    /// The requested configuration is invalid, e.g. capacity zero with a
    /// policy that requires bounded capacity.
    InvalidConfiguration(String),
    /// The `serialize` hook failed; the entry was not inserted.
    SerializerFailed(String),
    /// The `deserialize` hook failed; the entry remains resident.
    DeserializerFailed(String),
}

impl<E: fmt::Display> fmt::Display for CacheError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::NotFound => write!(f, "key not found"),
            CacheError::LoaderFailed(err) => write!(f, "loader failed: {err}"),
            CacheError::LoaderPanicked(msg) => write!(f, "loader panicked: {msg}"),
            CacheError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            CacheError::SerializerFailed(msg) => write!(f, "serializer failed: {msg}"),
            CacheError::DeserializerFailed(msg) => write!(f, "deserializer failed: {msg}"),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for CacheError<E> {}

impl<E> CacheError<E> {
    /// Returns `true` if this error is [`CacheError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound)
    }
}
