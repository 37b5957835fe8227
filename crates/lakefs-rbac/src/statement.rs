//! Semantic comparison of policy statements.
//!
//! A policy statement is caller-written JSON text. lakeFS stores and echoes
//! it with its own formatting and key order, so a byte comparison would
//! report drift on every refresh. Equality here is structural:
//!
//! - objects compare by key set and per-key value, ignoring key order
//! - arrays compare element-wise, in order
//! - numbers compare by numeric value as `f64` (`1` equals `1.0`)
//! - strings, booleans and `null` compare by value
//!
//! Text that does not parse is never equal to anything, so a malformed
//! statement shows up as a difference instead of being silently accepted.

use serde_json::Value;

/// Returns `true` if two value trees are equal irrespective of object key order.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(key, x)| ys.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => false,
    }
}

/// Returns `true` if both texts parse as JSON and are structurally equal.
#[must_use]
pub fn json_text_equal(a: &str, b: &str) -> bool {
    let Ok(a) = serde_json::from_str::<Value>(a) else {
        return false;
    };
    let Ok(b) = serde_json::from_str::<Value>(b) else {
        return false;
    };
    values_equal(&a, &b)
}

/// Picks the statement text to keep in state.
///
/// Keeps `local` verbatim when it means the same as `remote`, otherwise
/// adopts `remote` as the new source of truth.
#[must_use]
pub fn normalize(local: &str, remote: &str) -> String {
    if json_text_equal(local, remote) {
        local.to_string()
    } else {
        tracing::debug!("policy statement differs from the server copy, adopting server text");
        remote.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATEMENT: &str =
        r#"[{"effect":"allow","action":["fs:ReadObject"],"resource":"arn:lakefs:fs:::repository/*"}]"#;

    #[test]
    fn key_order_and_whitespace_are_ignored() {
        let reordered = r#"[
            {"resource": "arn:lakefs:fs:::repository/*", "action": ["fs:ReadObject"], "effect": "allow"}
        ]"#;
        assert!(json_text_equal(STATEMENT, reordered));
        assert_eq!(normalize(STATEMENT, reordered), STATEMENT);
    }

    #[test]
    fn array_order_matters() {
        let a = r#"[{"action":["fs:ReadObject","fs:ListObjects"]}]"#;
        let b = r#"[{"action":["fs:ListObjects","fs:ReadObject"]}]"#;
        assert!(!json_text_equal(a, b));
        assert_eq!(normalize(a, b), b);
    }

    #[test]
    fn different_actions_adopt_remote() {
        let remote =
            r#"[{"effect":"allow","action":["fs:WriteObject"],"resource":"arn:lakefs:fs:::repository/*"}]"#;
        assert_eq!(normalize(STATEMENT, remote), remote);
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(json_text_equal(r#"{"n":1}"#, r#"{"n":1.0}"#));
        assert!(!json_text_equal(r#"{"n":1}"#, r#"{"n":2}"#));
    }

    #[test]
    fn scalar_types_do_not_coerce() {
        assert!(!json_text_equal(r#"{"n":1}"#, r#"{"n":"1"}"#));
        assert!(!json_text_equal(r#"{"b":true}"#, r#"{"b":"true"}"#));
        assert!(!json_text_equal("null", r#"{}"#));
    }

    #[test]
    fn extra_or_missing_keys_differ() {
        assert!(!json_text_equal(r#"{"a":1}"#, r#"{"a":1,"b":2}"#));
        assert!(!json_text_equal(r#"{"a":1,"b":2}"#, r#"{"a":1}"#));
    }

    #[test]
    fn malformed_text_is_never_equal() {
        assert!(!json_text_equal("[{", STATEMENT));
        assert!(!json_text_equal(STATEMENT, "not json"));
        assert!(!json_text_equal("[{", "[{"));
        assert_eq!(normalize("[{", STATEMENT), STATEMENT);
    }

    #[test]
    fn nested_objects_ignore_order() {
        let a = r#"{"outer":{"x":[{"k":1,"j":2}],"y":null}}"#;
        let b = r#"{"outer":{"y":null,"x":[{"j":2,"k":1}]}}"#;
        assert!(json_text_equal(a, b));
    }
}
