//! pmgrid core types: rows, field access, columns, filters and errors.
//!
//! This crate provides:
//! - `Row` access by dotted path and the UI's string coercion rules
//! - Column descriptors and cell formats (see [`columns`])
//! - Filter kinds, filter sets and filter bar descriptors (see [`filter`])

#![forbid(unsafe_code)]

use serde_json::Value;

pub mod columns;
pub mod filter;

/// A table row: a JSON object mapping field names to values.
pub type Row = Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TableError {
    #[error("invalid page size: {0} (must be at least 1)")]
    InvalidPageSize(usize),
    #[error("unknown filter kind: {0}")]
    UnknownFilterKind(String),
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("invalid filter spec: {0}")]
    InvalidFilterSpec(String),
}

pub type TableResult<T> = Result<T, TableError>;

pub mod prelude {
    pub use super::columns::{col, column_by_key, CellFormat, ColumnSpec, FormatterRegistry};
    pub use super::filter::{FieldFilter, FilterField, FilterKind, FilterSet, SelectOption};
    pub use super::{field, present, stringify, Row, TableError, TableResult};
}

/// Resolve a dotted path (`"address.city"`) against a row.
/// Array segments are addressed by index (`"tags.0"`).
pub fn field<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    let mut cur = row;
    for seg in path.split('.') {
        cur = match cur {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cur)
}

/// Like [`field`], but treats an explicit `null` the same as a missing field.
pub fn present<'a>(row: &'a Row, path: &str) -> Option<&'a Value> {
    field(row, path).filter(|v| !v.is_null())
}

/// String coercion used for matching and display.
///
/// Integral floats print without a fractional part (`30.0` -> `"30"`), arrays
/// join their items with `,`, objects print as compact JSON.
pub fn stringify(v: &Value) -> String {
    match v {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }
        }
        Value::Array(items) => items.iter().map(stringify).collect::<Vec<_>>().join(","),
        Value::Object(_) => v.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_paths_reach_nested_fields() {
        let row = json!({ "name": "HQ", "address": { "city": "Shanghai" }, "tags": ["a", "b"] });
        assert_eq!(field(&row, "address.city"), Some(&json!("Shanghai")));
        assert_eq!(field(&row, "tags.1"), Some(&json!("b")));
        assert_eq!(field(&row, "address.zip"), None);
        assert_eq!(field(&row, "name.first"), None);
        assert_eq!(field(&row, ""), None);
    }

    #[test]
    fn present_skips_nulls() {
        let row = json!({ "age": null, "name": "Al" });
        assert!(field(&row, "age").is_some());
        assert!(present(&row, "age").is_none());
        assert!(present(&row, "missing").is_none());
        assert!(present(&row, "name").is_some());
    }

    #[test]
    fn stringify_follows_ui_coercion() {
        assert_eq!(stringify(&json!(30)), "30");
        assert_eq!(stringify(&json!(30.0)), "30");
        assert_eq!(stringify(&json!(2.5)), "2.5");
        assert_eq!(stringify(&json!(true)), "true");
        assert_eq!(stringify(&json!("x")), "x");
        assert_eq!(stringify(&json!([1, "b"])), "1,b");
        assert_eq!(stringify(&json!({"a": 1})), r#"{"a":1}"#);
    }
}
