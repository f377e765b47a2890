/// Normalizes a route pattern: lower case, no repeated slashes, no trailing
/// slash (the root `/` is kept).
///
/// ```
/// use memento_core::key::normalize_route;
///
/// assert_eq!(normalize_route("/API//Test/"), "/api/test");
/// assert_eq!(normalize_route("/"), "/");
/// ```
pub fn normalize_route(route: &str) -> String {
    let lower = route.to_lowercase();
    let mut normalized = String::with_capacity(lower.len());

    for c in lower.chars() {
        if c == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(c);
    }

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_route() {
        assert_eq!(normalize_route("/API//Test/"), "/api/test");
        assert_eq!(normalize_route("/users/{id}"), "/users/{id}");
        assert_eq!(normalize_route("///"), "/");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route(""), "");
        assert_eq!(normalize_route("/a///b//"), "/a/b");
    }
}
