//! Request fingerprints: the request dimensions a cache key is built from.

use axum::body::Bytes;
use axum::extract::{FromRequestParts, MatchedPath, Query, RawPathParams};
use axum::http::request::Parts;
use memento_core::CacheKeyBuilder;
use serde_json::{Map, Value};

use super::route::RoutePlan;

/// Key-relevant view of one request, before inclusion rules apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFingerprint {
    /// Route pattern the request matched, when the router recorded one.
    pub route: Option<String>,
    /// Path parameters by name.
    pub params: Option<Value>,
    /// Query string parameters by name.
    pub query: Option<Value>,
    /// Headers by lowercased name, repeated values joined with ", ".
    pub headers: Option<Value>,
    /// JSON body, or the raw text when it is not JSON.
    pub body: Option<Value>,
}

impl RequestFingerprint {
    /// Reads every dimension from the request head and its buffered body.
    pub async fn capture(parts: &mut Parts, body: &Bytes) -> Self {
        let params = RawPathParams::from_request_parts(parts, &())
            .await
            .ok()
            .map(|raw| {
                let map: Map<String, Value> = raw
                    .iter()
                    .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
                    .collect();
                Value::Object(map)
            });

        let route = parts
            .extensions
            .get::<MatchedPath>()
            .map(|matched| matched.as_str().to_string());

        Self {
            route,
            params,
            query: query_value(parts),
            headers: headers_value(parts),
            body: body_value(body),
        }
    }

    /// Builds the cache key of this request for a route.
    ///
    /// The matched pattern wins over the declared one, so nested routers
    /// key on their full path.
    pub fn cache_key(&self, prefix: &str, plan: &RoutePlan, custom: Option<&Value>) -> String {
        let route = self.route.as_deref().unwrap_or(plan.route.as_str());
        CacheKeyBuilder::new(prefix, "GET", route)
            .params(self.params.as_ref())
            .with_policy(
                &plan.include,
                self.query.as_ref(),
                self.headers.as_ref(),
                self.body.as_ref(),
            )
            .custom(custom)
            .build()
    }
}

/// Query parameters by name. A repeated name keeps every value, in order,
/// as an array.
fn query_value(parts: &Parts) -> Option<Value> {
    parts.uri.query()?;

    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri).ok()?;
    let mut map = Map::new();

    for (name, value) in pairs {
        let value = Value::String(value);
        match map.get_mut(&name) {
            Some(Value::Array(values)) => values.push(value),
            Some(first) => {
                let head = first.take();
                *first = Value::Array(vec![head, value]);
            },
            None => {
                map.insert(name, value);
            },
        }
    }

    Some(Value::Object(map))
}

fn headers_value(parts: &Parts) -> Option<Value> {
    let mut map = Map::new();

    for name in parts.headers.keys() {
        let joined = parts
            .headers
            .get_all(name)
            .iter()
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        // HeaderName is already lowercase
        map.insert(name.as_str().to_string(), Value::String(joined));
    }

    Some(Value::Object(map))
}

fn body_value(body: &Bytes) -> Option<Value> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}
