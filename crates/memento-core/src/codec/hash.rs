use serde_json::Value;
use sha2::{Digest, Sha256};

use super::stable_stringify;

/// Number of hex characters kept from the SHA-256 digest (128 bits).
pub const HASH_HEX_LEN: usize = 32;

/// Fingerprints a value: SHA-256 of its stable JSON text, truncated to
/// [`HASH_HEX_LEN`] hex characters.
///
/// # Examples
///
/// ```
/// use memento_core::codec::hash_data;
/// use serde_json::json;
///
/// let h1 = hash_data(Some(&json!({"a": 1, "b": 2})));
/// let h2 = hash_data(Some(&json!({"b": 2, "a": 1})));
/// assert_eq!(h1, h2);
/// assert_eq!(h1.len(), 32);
/// ```
pub fn hash_data(value: Option<&Value>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(stable_stringify(value).as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..HASH_HEX_LEN].to_string()
}

/// Shorthand for [`hash_data`] on a present value.
pub fn hash_value(value: &Value) -> String {
    hash_data(Some(value))
}
