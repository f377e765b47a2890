//! Include policies: which request dimensions take part in a cache key.
//!
//! A route declares an [`IncludeSpec`] (or nothing at all) and registration
//! resolves it into an [`IncludePolicy`]. The defaults are asymmetric:
//!
//! | Declaration                      | body     | query    | headers  |
//! |----------------------------------|----------|----------|----------|
//! | no policy at all                 | all      | disabled | disabled |
//! | policy that omits the dimension  | disabled | disabled | disabled |
//!
//! so `include: {}` turns body fingerprinting off, while declaring nothing
//! keeps it on.

use serde::{Deserialize, Serialize};

use crate::error::CacheConfigError;

/// Resolved inclusion of one request dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Inclusion {
    /// The dimension never contributes to the key.
    #[default]
    Disabled,
    /// The whole dimension contributes.
    All,
    /// Only the named fields contribute.
    Fields(Vec<String>),
}

impl Inclusion {
    /// Returns true unless the dimension is disabled.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Returns the field subset, if one was declared.
    pub fn fields(&self) -> Option<&[String]> {
        match self {
            Self::Fields(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Declared rule for one dimension: a flag, or an explicit field list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeRule {
    /// `true` includes everything, `false` nothing.
    Flag(bool),
    /// Include only these fields.
    Fields(Vec<String>),
}

/// Declared include policy, as written in route configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<IncludeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<IncludeRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<IncludeRule>,
}

/// Resolved include policy of a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludePolicy {
    pub body: Inclusion,
    pub query: Inclusion,
    pub headers: Inclusion,
}

impl Default for IncludePolicy {
    /// The policy of a route that declared nothing: body in, query and headers out.
    fn default() -> Self {
        Self {
            body: Inclusion::All,
            query: Inclusion::Disabled,
            headers: Inclusion::Disabled,
        }
    }
}

impl IncludePolicy {
    /// Resolves a declared spec.
    ///
    /// # Errors
    ///
    /// Returns [`CacheConfigError::MalformedInclude`] when a field list
    /// contains a blank name.
    ///
    /// # Examples
    ///
    /// ```
    /// use memento_core::{IncludePolicy, IncludeRule, IncludeSpec, Inclusion};
    ///
    /// let absent = IncludePolicy::resolve(None).unwrap();
    /// assert_eq!(absent.body, Inclusion::All);
    ///
    /// let spec = IncludeSpec {
    ///     query: Some(IncludeRule::Fields(vec!["page".into()])),
    ///     ..Default::default()
    /// };
    /// let explicit = IncludePolicy::resolve(Some(&spec)).unwrap();
    /// assert_eq!(explicit.body, Inclusion::Disabled);
    /// assert_eq!(explicit.query, Inclusion::Fields(vec!["page".into()]));
    /// ```
    pub fn resolve(spec: Option<&IncludeSpec>) -> Result<Self, CacheConfigError> {
        let Some(spec) = spec else {
            return Ok(Self::default());
        };

        Ok(Self {
            body: resolve_rule("body", spec.body.as_ref(), false)?,
            query: resolve_rule("query", spec.query.as_ref(), false)?,
            headers: resolve_rule("headers", spec.headers.as_ref(), true)?,
        })
    }
}

fn resolve_rule(
    dimension: &str,
    rule: Option<&IncludeRule>,
    case_insensitive: bool,
) -> Result<Inclusion, CacheConfigError> {
    match rule {
        None | Some(IncludeRule::Flag(false)) => Ok(Inclusion::Disabled),
        Some(IncludeRule::Flag(true)) => Ok(Inclusion::All),
        Some(IncludeRule::Fields(fields)) if fields.is_empty() => Ok(Inclusion::All),
        Some(IncludeRule::Fields(fields)) => {
            let mut resolved = Vec::with_capacity(fields.len());
            for field in fields {
                let trimmed = field.trim();
                if trimmed.is_empty() {
                    return Err(CacheConfigError::malformed_include(
                        dimension,
                        "field names cannot be blank",
                    ));
                }
                let name = if case_insensitive {
                    trimmed.to_ascii_lowercase()
                } else {
                    trimmed.to_string()
                };
                if !resolved.contains(&name) {
                    resolved.push(name);
                }
            }
            Ok(Inclusion::Fields(resolved))
        },
    }
}
