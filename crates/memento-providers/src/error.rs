//! Error types for cache providers.

/// Errors that can occur when talking to a cache provider.
///
/// Providers surface these as-is; deciding what a failure means for a request
/// (usually: treat it as a miss) is the job of the cache service.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The Redis client reported an error.
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The backing store is not reachable.
    #[error("provider unavailable: {reason}")]
    Unavailable { reason: String },

    /// A scan pattern could not be compiled.
    #[error("invalid key pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// The provider was disconnected and cannot serve requests anymore.
    #[error("provider is disconnected")]
    Disconnected,
}

impl ProviderError {
    /// Creates a new unavailable error.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid pattern error.
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is a transient error that might succeed on retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Unavailable { .. } => true,
            Self::Redis(e) => e.is_timeout() || e.is_connection_dropped() || e.is_io_error(),
            Self::InvalidPattern { .. } | Self::Disconnected => false,
        }
    }
}

/// Type alias for provider results.
pub type ProviderResult<T> = Result<T, ProviderError>;
