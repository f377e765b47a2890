//! Error types for Memento.
//!
//! Two families live here:
//!
//! - [`CacheConfigError`]: problems in a route's declared cache configuration.
//!   These are raised synchronously while routes are registered, so a bad
//!   declaration stops the process at startup instead of degrading traffic.
//! - [`CodecError`]: failures while encoding or decoding cached payloads.
//!   Callers on the request path treat these as cache misses.
//!
//! # Example
//!
//! ```
//! use memento_core::CacheConfigError;
//!
//! let error = CacheConfigError::non_get_method("POST", "/users");
//! assert!(error.is_method_error());
//! println!("{}", error); // "cache configuration is only allowed on GET routes..."
//! ```

use std::io;
use thiserror::Error;

/// Errors in a route's declared cache configuration.
#[derive(Debug, Error)]
pub enum CacheConfigError {
    /// Cache options were declared on a route whose method is not GET.
    #[error("cache configuration is only allowed on GET routes, got {method} {route}")]
    NonGetMethod {
        /// HTTP method of the offending route
        method: String,
        /// Route pattern of the offending route
        route: String,
    },

    /// The declared TTL is outside the accepted range.
    #[error("cache ttl must be between {min} and {max} seconds, got {ttl}")]
    TtlOutOfRange {
        /// Declared TTL in seconds
        ttl: u64,
        /// Lower bound (inclusive)
        min: u64,
        /// Upper bound (inclusive)
        max: u64,
    },

    /// An include policy is malformed.
    #[error("invalid include policy for '{dimension}': {reason}")]
    MalformedInclude {
        /// The request dimension (body, query, headers)
        dimension: String,
        /// Why it's invalid
        reason: String,
    },

    /// A tag is empty or blank.
    #[error("cache tags cannot be blank")]
    BlankTag,
}

impl CacheConfigError {
    // ============================================
    // Convenience constructors
    // ============================================

    /// Creates a NonGetMethod error.
    pub fn non_get_method(method: impl Into<String>, route: impl Into<String>) -> Self {
        Self::NonGetMethod {
            method: method.into(),
            route: route.into(),
        }
    }

    /// Creates a MalformedInclude error.
    pub fn malformed_include(dimension: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInclude {
            dimension: dimension.into(),
            reason: reason.into(),
        }
    }

    // ============================================
    // Query methods
    // ============================================

    /// Returns true if the error comes from declaring cache options on a non-GET route.
    pub fn is_method_error(&self) -> bool {
        matches!(self, Self::NonGetMethod { .. })
    }

    /// Returns true if the error comes from a malformed include policy.
    pub fn is_include_error(&self) -> bool {
        matches!(self, Self::MalformedInclude { .. })
    }
}

/// Errors produced while encoding or decoding cached payloads.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Gzip stream failure.
    #[error("compression error: {0}")]
    Compression(#[from] io::Error),

    /// The compressed payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decompressed payload is not valid UTF-8.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON (de)serialization failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Results with CodecError.
pub type CodecResult<T> = std::result::Result<T, CodecError>;
