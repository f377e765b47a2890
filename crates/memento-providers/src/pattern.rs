//! Glob-style key patterns.

use glob::{MatchOptions, Pattern};

use crate::error::{ProviderError, ProviderResult};

/// A compiled glob pattern over cache keys.
///
/// `*` matches any run of characters (including `:` and `/`), `?` matches a
/// single character, and the whole key must match.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    pattern: Pattern,
}

impl KeyPattern {
    const OPTIONS: MatchOptions = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    /// Compiles a pattern.
    pub fn new(source: &str) -> ProviderResult<Self> {
        let pattern = Pattern::new(source)
            .map_err(|e| ProviderError::invalid_pattern(source, e.msg))?;

        Ok(Self { pattern })
    }

    /// Returns true if the whole key matches.
    pub fn matches(&self, key: &str) -> bool {
        self.pattern.matches_with(key, Self::OPTIONS)
    }
}
