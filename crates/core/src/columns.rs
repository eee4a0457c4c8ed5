//! Column descriptors and cell formats.
//!
//! This module provides:
//! - `ColumnSpec`: key (dotted path), title, sortability, width hint, cell format
//! - `CellFormat`: the tagged union of cell rendering strategies
//! - `FormatterRegistry`: named formatters owned by the rendering layer

use std::fmt::Write;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::{present, stringify, Row};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub title: String,
    #[serde(default = "default_sortable")]
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    #[serde(default)]
    pub format: CellFormat,
}

fn default_sortable() -> bool {
    true
}

/// How a cell value becomes display text.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CellFormat {
    /// String coercion of the raw value.
    #[default]
    Plain,
    /// Value -> label lookup (status codes, dictionary values).
    Mapped {
        labels: SmallVec<[(String, String); 4]>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fallback: Option<String>,
    },
    /// Truthy/falsy labels. Strings `"true"`, `"1"`, `"enabled"` count as truthy.
    Boolean { yes: String, no: String },
    /// Reformat a timestamp (RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, or epoch secs/millis).
    DateTime { pattern: String },
    /// Fixed decimals with optional thousands separators.
    Number {
        #[serde(default)]
        decimals: usize,
        #[serde(default)]
        thousands: bool,
    },
    /// Resolved through a [`FormatterRegistry`]; unknown names fall back to `Plain`.
    Named { name: String },
}

pub fn col(key: &str, title: &str) -> ColumnSpec {
    ColumnSpec {
        key: key.to_string(),
        title: title.to_string(),
        sortable: true,
        width: None,
        format: CellFormat::Plain,
    }
}

impl ColumnSpec {
    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn format(mut self, format: CellFormat) -> Self {
        self.format = format;
        self
    }

    /// Display text for this column's cell in `row`. `None` when the field is null or missing.
    pub fn render(&self, row: &Row, registry: &FormatterRegistry) -> Option<String> {
        present(row, &self.key).map(|v| self.format.apply(v, registry))
    }
}

pub fn column_by_key<'a>(cols: &'a [ColumnSpec], key: &str) -> Option<&'a ColumnSpec> {
    cols.iter().find(|c| c.key == key)
}

impl CellFormat {
    pub fn mapped<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        CellFormat::Mapped {
            labels: pairs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            fallback: None,
        }
    }

    pub fn apply(&self, v: &Value, registry: &FormatterRegistry) -> String {
        match self {
            CellFormat::Plain => stringify(v),
            CellFormat::Mapped { labels, fallback } => {
                let raw = stringify(v);
                labels
                    .iter()
                    .find(|(k, _)| *k == raw)
                    .map(|(_, label)| label.clone())
                    .or_else(|| fallback.clone())
                    .unwrap_or(raw)
            }
            CellFormat::Boolean { yes, no } => {
                if truthy(v) { yes.clone() } else { no.clone() }
            }
            CellFormat::DateTime { pattern } => match parse_datetime(v) {
                // Bad directives (`%Q`) or ones a naive time cannot fill (`%z`) error here.
                Some(dt) => {
                    let mut out = String::new();
                    match write!(out, "{}", dt.format(pattern)) {
                        Ok(()) => out,
                        Err(_) => stringify(v),
                    }
                }
                None => stringify(v),
            },
            CellFormat::Number { decimals, thousands } => {
                let n = match v {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                match n {
                    Some(f) => format_number(f, *decimals, *thousands),
                    None => stringify(v),
                }
            }
            CellFormat::Named { name } => match registry.get(name) {
                Some(f) => f(v),
                None => stringify(v),
            },
        }
    }
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => {
            matches!(s.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "enabled")
        }
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) => true,
    }
}

fn parse_datetime(v: &Value) -> Option<NaiveDateTime> {
    match v {
        Value::Number(n) => {
            let raw = n.as_i64()?;
            // Values past 1e11 are epoch millis (year 5138 in seconds).
            let (secs, millis) =
                if raw.abs() >= 100_000_000_000 { (raw / 1000, raw % 1000) } else { (raw, 0) };
            DateTime::from_timestamp(secs, (millis.unsigned_abs() as u32) * 1_000_000)
                .map(|dt| dt.naive_utc())
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.naive_local());
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt);
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d").ok().and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        _ => None,
    }
}

fn format_number(f: f64, decimals: usize, thousands: bool) -> String {
    let s = format!("{:.*}", decimals, f);
    if !thousands {
        return s;
    }
    let (sign, body) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let (int, frac) = match body.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (body, None),
    };
    let mut out = String::with_capacity(s.len() + int.len() / 3);
    out.push_str(sign);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub type Formatter = Box<dyn Fn(&Value) -> String + Send + Sync>;

/// Named cell formatters supplied by the rendering layer.
#[derive(Default)]
pub struct FormatterRegistry {
    fns: FxHashMap<String, Formatter>,
}

impl FormatterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.fns.insert(name.into(), Box::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&Formatter> {
        self.fns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fns.contains_key(name)
    }
}

impl std::fmt::Debug for FormatterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.fns.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        f.debug_struct("FormatterRegistry").field("names", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_and_null_render() {
        let reg = FormatterRegistry::new();
        let c = col("address.city", "City");
        let row = json!({ "address": { "city": "Hangzhou" } });
        assert_eq!(c.render(&row, &reg).as_deref(), Some("Hangzhou"));
        assert_eq!(c.render(&json!({"address": {"city": null}}), &reg), None);
        assert_eq!(c.render(&json!({}), &reg), None);
    }

    #[test]
    fn mapped_labels_with_fallback() {
        let reg = FormatterRegistry::new();
        let fmt = CellFormat::mapped([("enabled", "Enabled"), ("disabled", "Disabled")]);
        assert_eq!(fmt.apply(&json!("enabled"), &reg), "Enabled");
        assert_eq!(fmt.apply(&json!("archived"), &reg), "archived");
        let fmt = CellFormat::Mapped { labels: SmallVec::new(), fallback: Some("?".into()) };
        assert_eq!(fmt.apply(&json!("archived"), &reg), "?");
    }

    #[test]
    fn boolean_labels() {
        let reg = FormatterRegistry::new();
        let fmt = CellFormat::Boolean { yes: "Y".into(), no: "N".into() };
        assert_eq!(fmt.apply(&json!(true), &reg), "Y");
        assert_eq!(fmt.apply(&json!(0), &reg), "N");
        assert_eq!(fmt.apply(&json!("enabled"), &reg), "Y");
    }

    #[test]
    fn datetime_reformats_common_inputs() {
        let reg = FormatterRegistry::new();
        let fmt = CellFormat::DateTime { pattern: "%Y/%m/%d".into() };
        assert_eq!(fmt.apply(&json!("2024-03-05 10:20:30"), &reg), "2024/03/05");
        assert_eq!(fmt.apply(&json!("2024-03-05"), &reg), "2024/03/05");
        assert_eq!(fmt.apply(&json!("2024-03-05T10:20:30Z"), &reg), "2024/03/05");
        assert_eq!(fmt.apply(&json!(0), &reg), "1970/01/01");
        assert_eq!(fmt.apply(&json!("soon"), &reg), "soon");
    }

    #[test]
    fn unusable_datetime_pattern_keeps_raw_value() {
        let reg = FormatterRegistry::new();
        let c: ColumnSpec = serde_json::from_value(json!({
            "key": "createdAt",
            "title": "Created",
            "format": { "type": "date_time", "pattern": "%Q" }
        }))
        .unwrap();
        let row = json!({ "createdAt": "2024-03-05" });
        assert_eq!(c.render(&row, &reg).as_deref(), Some("2024-03-05"));
        let offset = CellFormat::DateTime { pattern: "%Y %z".into() };
        assert_eq!(offset.apply(&json!("2024-03-05 10:00"), &reg), "2024-03-05 10:00");
    }

    #[test]
    fn number_grouping() {
        let reg = FormatterRegistry::new();
        let fmt = CellFormat::Number { decimals: 2, thousands: true };
        assert_eq!(fmt.apply(&json!(1234567.891), &reg), "1,234,567.89");
        assert_eq!(fmt.apply(&json!(-1000), &reg), "-1,000.00");
        assert_eq!(fmt.apply(&json!("42"), &reg), "42.00");
        let fmt = CellFormat::Number { decimals: 0, thousands: false };
        assert_eq!(fmt.apply(&json!(999.6), &reg), "1000");
    }

    #[test]
    fn named_formatters_resolve_through_registry() {
        let mut reg = FormatterRegistry::new();
        reg.register("upper", |v: &Value| stringify(v).to_uppercase());
        assert!(reg.contains("upper"));
        assert_eq!(CellFormat::Named { name: "upper".into() }.apply(&json!("hq"), &reg), "HQ");
        assert_eq!(CellFormat::Named { name: "missing".into() }.apply(&json!("hq"), &reg), "hq");
    }

    #[test]
    fn column_spec_deserializes_with_defaults() {
        let c: ColumnSpec =
            serde_json::from_value(json!({ "key": "name", "title": "Name" })).unwrap();
        assert!(c.sortable);
        assert_eq!(c.format, CellFormat::Plain);
        let c: ColumnSpec = serde_json::from_value(json!({
            "key": "status", "title": "Status", "sortable": false,
            "format": { "type": "boolean", "yes": "On", "no": "Off" }
        }))
        .unwrap();
        assert!(!c.sortable);
        assert_eq!(c.format, CellFormat::Boolean { yes: "On".into(), no: "Off".into() });
    }
}
