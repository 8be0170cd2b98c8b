//! Bound values, rows and SQL literal escaping.
//!
//! Values are plain [`serde_json::Value`]s: string, boolean, number, null, or a structured
//! array/object. Structured values are stored the way a driver would store a serialized blob
//! column: compact JSON text inside a quoted string literal.

use crate::error::{DbError, DbResult};
use serde::Serialize;

pub use serde_json::Value;

/// A single result row: column name to value, in column order.
pub type Row = serde_json::Map<String, Value>;

/// Build a `Vec<Value>` of bound parameters from anything convertible into [`Value`].
///
/// ```
/// use fakedb::{params, Value};
///
/// let values = params![1, "Leo", true, Value::Null];
/// assert_eq!(values.len(), 4);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}

/// Escape a value into its SQL literal form.
pub fn escape(value: &Value) -> String {
    match value {
        Value::String(s) => escape_string(s),
        Value::Bool(true) => "1".to_string(),
        Value::Bool(false) => "0".to_string(),
        Value::Null => "NULL".to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => escape_string(&value.to_string()),
    }
}

/// Wrap a string in single quotes, backslash-escaping embedded quotes.
pub fn escape_string(s: &str) -> String {
    format!("'{}'", s.replace('\'', "\\'"))
}

pub(crate) fn escape_all(values: &[Value]) -> Vec<String> {
    values.iter().map(escape).collect()
}

/// Serialize anything into a [`Row`]. The value must serialize to an object.
pub fn to_row<T: Serialize>(data: T) -> DbResult<Row> {
    match serde_json::to_value(data)? {
        Value::Object(row) => Ok(row),
        other => Err(DbError::Serialization(format!(
            "row must serialize to an object, got {}",
            kind_name(&other)
        ))),
    }
}

/// The key a value takes when used as a row key.
///
/// `null` is not a key.
pub(crate) fn row_key(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        other => Some(other.to_string()),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_scalars() {
        assert_eq!(escape(&json!("Leo")), "'Leo'");
        assert_eq!(escape(&json!(true)), "1");
        assert_eq!(escape(&json!(false)), "0");
        assert_eq!(escape(&Value::Null), "NULL");
        assert_eq!(escape(&json!(42)), "42");
        assert_eq!(escape(&json!(-7)), "-7");
        assert_eq!(escape(&json!(1.5)), "1.5");
    }

    #[test]
    fn escape_quotes_in_strings() {
        assert_eq!(escape(&json!("it's")), r"'it\'s'");
        assert_eq!(escape_string("''"), r"'\'\''");
    }

    #[test]
    fn escape_structured_values() {
        assert_eq!(escape(&json!([1, "a"])), r#"'[1,"a"]'"#);
        assert_eq!(escape(&json!({"k": "it's"})), r#"'{"k":"it\'s"}'"#);
    }

    #[test]
    fn params_macro_converts() {
        let values = params![1, "x", false, Value::Null, 2.5];
        assert_eq!(
            values,
            vec![json!(1), json!("x"), json!(false), Value::Null, json!(2.5)]
        );
        assert!(params![].is_empty());
    }

    #[test]
    fn to_row_requires_object() {
        let row = to_row(json!({"id": 1, "name": "a"})).unwrap();
        assert_eq!(row.keys().collect::<Vec<_>>(), vec!["id", "name"]);

        let err = to_row(json!([1, 2])).unwrap_err();
        assert!(matches!(err, DbError::Serialization(_)));
    }

    #[test]
    fn row_keys() {
        assert_eq!(row_key(&json!(1)), Some("1".to_string()));
        assert_eq!(row_key(&json!("abc")), Some("abc".to_string()));
        assert_eq!(row_key(&json!(true)), Some("1".to_string()));
        assert_eq!(row_key(&Value::Null), None);
    }
}
