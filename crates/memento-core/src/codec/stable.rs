use serde::Serialize;
use serde_json::Value;

use crate::error::CodecResult;

/// Serializes a JSON value with object keys sorted lexicographically.
///
/// `None` stands for an absent value and renders as the empty string;
/// `Some(Value::Null)` renders as `null`. Arrays keep their order. Scalars use
/// the standard JSON encoding.
///
/// # Examples
///
/// ```
/// use memento_core::codec::stable_stringify;
/// use serde_json::json;
///
/// let a = json!({"b": 2, "a": 1});
/// let b = json!({"a": 1, "b": 2});
/// assert_eq!(stable_stringify(Some(&a)), stable_stringify(Some(&b)));
/// assert_eq!(stable_stringify(Some(&a)), r#"{"a":1,"b":2}"#);
/// assert_eq!(stable_stringify(None), "");
/// ```
pub fn stable_stringify(value: Option<&Value>) -> String {
    match value {
        None => String::new(),
        Some(value) => {
            let mut out = String::new();
            write_stable(value, &mut out);
            out
        },
    }
}

/// Converts any serializable value to JSON and renders it with [`stable_stringify`].
pub fn stable_stringify_serialize<T: Serialize + ?Sized>(value: &T) -> CodecResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(stable_stringify(Some(&value)))
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_stable(&map[key.as_str()], out);
            }
            out.push('}');
        },
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        },
        scalar => out.push_str(&scalar.to_string()),
    }
}
