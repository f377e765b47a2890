//! Per-route cache declarations and their validation.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use axum::http::request::Parts;
use memento_core::{CacheConfigError, IncludePolicy, IncludeSpec, LockBehavior, validate_ttl};
use serde::Deserialize;
use serde_json::Value;

use super::service::{CacheServiceOptions, SetOptions};
use super::single_flight::FlightPlan;

/// Computes an extra key segment from the incoming request.
///
/// Returning `None` leaves the key unchanged. Plain functions and closures
/// `Fn(&Parts) -> Option<Value>` implement this trait.
#[async_trait]
pub trait CacheDiscriminator: Send + Sync {
    async fn discriminate(&self, parts: &Parts) -> Option<Value>;
}

#[async_trait]
impl<F> CacheDiscriminator for F
where
    F: Fn(&Parts) -> Option<Value> + Send + Sync,
{
    async fn discriminate(&self, parts: &Parts) -> Option<Value> {
        self(parts)
    }
}

/// Cache options declared on a GET route.
///
/// Deserializable so routes can be configured from files; the
/// discriminator can only be attached in code.
///
/// ```
/// use memento_server::cache::RouteCacheConfig;
///
/// let config: RouteCacheConfig = serde_json::from_str(
///     r#"{"ttl": 60, "tags": ["users"], "lockBehavior": "bypass"}"#,
/// ).unwrap();
/// assert_eq!(config.ttl, Some(60));
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RouteCacheConfig {
    /// TTL in seconds; the service default when absent.
    #[serde(default)]
    pub ttl: Option<u64>,
    /// Compress payloads above the service threshold.
    #[serde(default)]
    pub compressed: bool,
    /// Tags every entry of this route is registered under.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lock behavior; the service default when absent.
    #[serde(default)]
    pub lock_behavior: Option<LockBehavior>,
    /// Which request dimensions take part in the key.
    #[serde(default)]
    pub include: Option<IncludeSpec>,
    #[serde(skip)]
    pub discriminator: Option<Arc<dyn CacheDiscriminator>>,
}

impl fmt::Debug for RouteCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteCacheConfig")
            .field("ttl", &self.ttl)
            .field("compressed", &self.compressed)
            .field("tags", &self.tags)
            .field("lock_behavior", &self.lock_behavior)
            .field("include", &self.include)
            .field("discriminator", &self.discriminator.is_some())
            .finish()
    }
}

impl RouteCacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ttl(mut self, ttl: u64) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn compressed(mut self, compressed: bool) -> Self {
        self.compressed = compressed;
        self
    }

    pub fn tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn lock_behavior(mut self, behavior: LockBehavior) -> Self {
        self.lock_behavior = Some(behavior);
        self
    }

    pub fn include(mut self, include: IncludeSpec) -> Self {
        self.include = Some(include);
        self
    }

    pub fn discriminator<D>(mut self, discriminator: D) -> Self
    where
        D: CacheDiscriminator + 'static,
    {
        self.discriminator = Some(Arc::new(discriminator));
        self
    }

    /// Checks the declaration against the route's method and resolves
    /// service defaults.
    ///
    /// Fails for any method other than GET, a TTL outside the accepted
    /// range, a blank tag, or a malformed include policy.
    pub fn validate(
        self,
        method: &Method,
        route: &str,
        defaults: &CacheServiceOptions,
    ) -> Result<RoutePlan, CacheConfigError> {
        if *method != Method::GET {
            return Err(CacheConfigError::non_get_method(method.as_str(), route));
        }

        let ttl = validate_ttl(self.ttl.unwrap_or(defaults.default_ttl))?;

        if self.tags.iter().any(|t| t.trim().is_empty()) {
            return Err(CacheConfigError::BlankTag);
        }

        let include = IncludePolicy::resolve(self.include.as_ref())?;

        Ok(RoutePlan {
            route: route.to_string(),
            include,
            flight: FlightPlan {
                ttl,
                behavior: self.lock_behavior.unwrap_or(defaults.lock_behavior),
                set_options: SetOptions {
                    compressed: self.compressed,
                    tags: self.tags,
                },
            },
            discriminator: self.discriminator,
        })
    }
}

/// A validated route declaration, ready to serve requests.
#[derive(Clone)]
pub struct RoutePlan {
    /// Route pattern used as the key's route segment.
    pub route: String,
    pub include: IncludePolicy,
    pub flight: FlightPlan,
    pub discriminator: Option<Arc<dyn CacheDiscriminator>>,
}

impl fmt::Debug for RoutePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoutePlan")
            .field("route", &self.route)
            .field("include", &self.include)
            .field("flight", &self.flight)
            .field("discriminator", &self.discriminator.is_some())
            .finish()
    }
}
