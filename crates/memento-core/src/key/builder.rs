use std::borrow::Cow;

use serde_json::{Map, Value};

use super::normalize_route;
use crate::codec::hash_value;
use crate::policy::{IncludePolicy, Inclusion};

/// A dimension that made it past its inclusion flag.
#[derive(Debug, Clone, Copy)]
struct Selection<'a> {
    value: &'a Value,
    fields: Option<&'a [String]>,
}

impl<'a> Selection<'a> {
    fn of(value: Option<&'a Value>, inclusion: &'a Inclusion) -> Option<Self> {
        if !inclusion.is_enabled() {
            return None;
        }
        value.map(|value| Self {
            value,
            fields: inclusion.fields(),
        })
    }

    fn hash(&self) -> (bool, String) {
        let selected = select_keys(self.value, self.fields);
        (is_empty(&selected), hash_value(&selected))
    }
}

/// Builds the cache key of one request.
///
/// The builder is pure: the same inputs always produce byte-identical keys,
/// whatever the order of object fields. Evaluating a custom discriminator is
/// up to the caller, who passes the resulting value to [`custom`](Self::custom).
///
/// # Examples
///
/// ```
/// use memento_core::key::CacheKeyBuilder;
/// use serde_json::json;
///
/// let params = json!({"id": "42"});
/// let key = CacheKeyBuilder::new("cache", "get", "/Users/{id}/")
///     .params(Some(&params))
///     .build();
///
/// assert!(key.starts_with("cache:global:GET:/users/{id}:"));
/// ```
#[derive(Debug, Clone)]
pub struct CacheKeyBuilder<'a> {
    prefix: &'a str,
    method: &'a str,
    route: &'a str,
    params: Option<&'a Value>,
    query: Option<Selection<'a>>,
    body: Option<Selection<'a>>,
    headers: Option<Selection<'a>>,
    custom: Option<&'a Value>,
}

impl<'a> CacheKeyBuilder<'a> {
    /// Starts a key for the given prefix, method and route pattern.
    pub fn new(prefix: &'a str, method: &'a str, route: &'a str) -> Self {
        Self {
            prefix,
            method,
            route,
            params: None,
            query: None,
            body: None,
            headers: None,
            custom: None,
        }
    }

    /// Route parameters. They always take part in the key when non-empty.
    pub fn params(mut self, params: Option<&'a Value>) -> Self {
        self.params = params;
        self
    }

    /// Query string, filtered by its inclusion.
    pub fn query(mut self, query: Option<&'a Value>, inclusion: &'a Inclusion) -> Self {
        self.query = Selection::of(query, inclusion);
        self
    }

    /// Request headers, filtered by their inclusion.
    pub fn headers(mut self, headers: Option<&'a Value>, inclusion: &'a Inclusion) -> Self {
        self.headers = Selection::of(headers, inclusion);
        self
    }

    /// Request body, filtered by its inclusion. A JSON `null` body counts as absent.
    pub fn body(mut self, body: Option<&'a Value>, inclusion: &'a Inclusion) -> Self {
        self.body = Selection::of(body.filter(|b| !b.is_null()), inclusion);
        self
    }

    /// Applies all three inclusions of a resolved policy at once.
    pub fn with_policy(
        self,
        policy: &'a IncludePolicy,
        query: Option<&'a Value>,
        headers: Option<&'a Value>,
        body: Option<&'a Value>,
    ) -> Self {
        self.query(query, &policy.query)
            .headers(headers, &policy.headers)
            .body(body, &policy.body)
    }

    /// Pre-evaluated custom discriminator.
    pub fn custom(mut self, custom: Option<&'a Value>) -> Self {
        self.custom = custom;
        self
    }

    /// Joins the segments into the final key.
    pub fn build(&self) -> String {
        let mut segments: Vec<String> = vec![
            self.prefix.to_string(),
            "global".to_string(),
            self.method.to_uppercase(),
            normalize_route(self.route),
        ];

        if let Some(params) = self.params.filter(|p| !is_empty(p)) {
            segments.push(hash_value(params));
        }

        if let Some(query) = &self.query {
            let (empty, hash) = query.hash();
            if !empty {
                segments.push(format!("q:{}", hash));
            }
        }

        // Body presence alone decides the segment, even for an empty selection.
        if let Some(body) = &self.body {
            let (_, hash) = body.hash();
            segments.push(format!("b:{}", hash));
        }

        if let Some(headers) = &self.headers {
            let (empty, hash) = headers.hash();
            if !empty {
                segments.push(format!("h:{}", hash));
            }
        }

        if let Some(custom) = self.custom {
            segments.push(format!("c:{}", hash_value(custom)));
        }

        segments.join(":")
    }
}

/// Keeps only the named fields of an object.
///
/// With no field list (or an empty one) the data is returned unchanged. With a
/// list, fields missing from the data are skipped, and non-object data yields
/// an empty object.
///
/// ```
/// use memento_core::key::select_keys;
/// use serde_json::json;
///
/// let data = json!({"page": 1, "size": 10, "sort": "asc"});
/// let fields = vec!["page".to_string(), "missing".to_string()];
/// assert_eq!(*select_keys(&data, Some(&fields)), json!({"page": 1}));
/// assert_eq!(*select_keys(&data, None), data);
/// ```
pub fn select_keys<'v>(data: &'v Value, keys: Option<&[String]>) -> Cow<'v, Value> {
    let Some(keys) = keys.filter(|k| !k.is_empty()) else {
        return Cow::Borrowed(data);
    };

    let mut selected = Map::new();
    if let Value::Object(map) = data {
        for key in keys {
            if let Some(value) = map.get(key) {
                selected.insert(key.clone(), value.clone());
            }
        }
    }

    Cow::Owned(Value::Object(selected))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn segments(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }

    #[test]
    fn test_minimal_key() {
        let key = CacheKeyBuilder::new("cache", "get", "/Health/").build();
        assert_eq!(key, "cache:global:GET:/health");
    }

    #[test]
    fn test_params_always_included() {
        let params = json!({"id": "7"});
        let key = CacheKeyBuilder::new("cache", "GET", "/users/{id}")
            .params(Some(&params))
            .build();

        assert_eq!(segments(&key).len(), 5);
        assert_eq!(segments(&key)[4], hash_value(&params));
    }

    #[test]
    fn test_empty_params_are_skipped() {
        let params = json!({});
        let key = CacheKeyBuilder::new("cache", "GET", "/users")
            .params(Some(&params))
            .build();

        assert_eq!(key, "cache:global:GET:/users");
    }

    #[test]
    fn test_disabled_query_is_ignored() {
        let query = json!({"page": 1});
        let key = CacheKeyBuilder::new("cache", "GET", "/users")
            .query(Some(&query), &Inclusion::Disabled)
            .build();

        assert_eq!(key, "cache:global:GET:/users");
    }

    #[test]
    fn test_query_subset_with_no_match_adds_nothing() {
        let query = json!({"utm_source": "mail"});
        let inclusion = Inclusion::Fields(vec!["page".into()]);
        let key = CacheKeyBuilder::new("cache", "GET", "/users")
            .query(Some(&query), &inclusion)
            .build();

        assert_eq!(key, "cache:global:GET:/users");
    }

    #[test]
    fn test_query_subset_ignores_other_fields() {
        let inclusion = Inclusion::Fields(vec!["page".into()]);
        let q1 = json!({"page": 2, "utm_source": "mail"});
        let q2 = json!({"page": 2, "utm_source": "ads"});

        let k1 = CacheKeyBuilder::new("cache", "GET", "/users")
            .query(Some(&q1), &inclusion)
            .build();
        let k2 = CacheKeyBuilder::new("cache", "GET", "/users")
            .query(Some(&q2), &inclusion)
            .build();

        assert_eq!(k1, k2);
        assert!(k1.contains(":q:"));
    }

    #[test]
    fn test_empty_body_selection_still_adds_segment() {
        let body = json!({"other": true});
        let inclusion = Inclusion::Fields(vec!["filter".into()]);
        let key = CacheKeyBuilder::new("cache", "GET", "/search")
            .body(Some(&body), &inclusion)
            .build();

        assert_eq!(key, format!("cache:global:GET:/search:b:{}", hash_value(&json!({}))));
    }

    #[test]
    fn test_null_body_adds_nothing() {
        let key = CacheKeyBuilder::new("cache", "GET", "/search")
            .body(Some(&Value::Null), &Inclusion::All)
            .build();

        assert_eq!(key, "cache:global:GET:/search");
    }

    #[test]
    fn test_segment_order() {
        let params = json!({"id": 1});
        let query = json!({"page": 1});
        let headers = json!({"accept-language": "es"});
        let body = json!({"q": "x"});
        let custom = json!("tenant-a");
        let policy = IncludePolicy {
            body: Inclusion::All,
            query: Inclusion::All,
            headers: Inclusion::All,
        };

        let key = CacheKeyBuilder::new("cache", "GET", "/items/{id}")
            .params(Some(&params))
            .with_policy(&policy, Some(&query), Some(&headers), Some(&body))
            .custom(Some(&custom))
            .build();

        let parts = segments(&key);
        assert_eq!(parts[5], "q");
        assert_eq!(parts[7], "b");
        assert_eq!(parts[9], "h");
        assert_eq!(parts[11], "c");
        assert_eq!(parts.len(), 13);
    }

    #[test]
    fn test_select_keys_on_non_object() {
        let fields = vec!["a".to_string()];
        assert_eq!(*select_keys(&json!([1, 2]), Some(&fields)), json!({}));
        assert_eq!(*select_keys(&json!("s"), Some(&[])), json!("s"));
    }
}
