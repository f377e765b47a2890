#![allow(dead_code)]
use memento_core::{CacheKeyBuilder, IncludePolicy, Inclusion};
use serde_json::{Value, json};

/// Policy with every dimension fully enabled.
pub fn include_everything() -> IncludePolicy {
    IncludePolicy {
        body: Inclusion::All,
        query: Inclusion::All,
        headers: Inclusion::All,
    }
}

/// A request fixture with every dimension populated.
pub struct RequestFixture {
    pub params: Value,
    pub query: Value,
    pub headers: Value,
    pub body: Value,
}

impl RequestFixture {
    pub fn sample() -> Self {
        Self {
            params: json!({"org": "acme", "id": "42"}),
            query: json!({"page": 2, "size": 20, "sort": ["name", "-created"]}),
            headers: json!({"accept-language": "es-CO", "x-tenant": "blue"}),
            body: json!({"filter": {"status": "active", "tags": ["a", "b"]}}),
        }
    }

    /// Builds a key for this fixture under the given policy.
    pub fn key(&self, policy: &IncludePolicy) -> String {
        CacheKeyBuilder::new("cache", "GET", "/orgs/{org}/items/{id}")
            .params(Some(&self.params))
            .with_policy(
                policy,
                Some(&self.query),
                Some(&self.headers),
                Some(&self.body),
            )
            .build()
    }
}
