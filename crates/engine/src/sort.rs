//! Sort state and the row comparator.

use std::cmp::Ordering;

use pmgrid_core::{present, stringify, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortDirection {
    /// Header suffix for sort indicators.
    pub fn indicator(&self) -> &'static str {
        match self {
            SortDirection::None => "",
            SortDirection::Ascending => " ↑",
            SortDirection::Descending => " ↓",
        }
    }
}

/// At most one sorted column. `column` is `None` exactly when `direction` is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    pub fn ascending(key: &str) -> Self {
        Self { column: Some(key.to_string()), direction: SortDirection::Ascending }
    }

    pub fn descending(key: &str) -> Self {
        Self { column: Some(key.to_string()), direction: SortDirection::Descending }
    }

    pub fn is_active(&self) -> bool {
        self.column.is_some() && self.direction != SortDirection::None
    }

    /// Direction shown on `key`'s header.
    pub fn direction_for(&self, key: &str) -> SortDirection {
        match &self.column {
            Some(c) if c == key => self.direction,
            _ => SortDirection::None,
        }
    }

    /// Next state after the header of `key` is clicked:
    /// other column -> ascending, ascending -> descending, descending -> unsorted.
    pub fn advance(&self, key: &str) -> Self {
        match self.direction_for(key) {
            SortDirection::None => Self::ascending(key),
            SortDirection::Ascending => Self::descending(key),
            SortDirection::Descending => Self::default(),
        }
    }
}

/// Compare two rows on `key`. Null and missing values trail in both directions.
pub fn compare_rows(a: &Row, b: &Row, key: &str, direction: SortDirection) -> Ordering {
    match (present(a, key), present(b, key)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y);
            if direction == SortDirection::Descending { ord.reverse() } else { ord }
        }
    }
}

/// Total order over non-null values. Values rank by type first (numbers, booleans,
/// strings, arrays, objects) and compare within their type: numbers as `f64` via
/// `total_cmp`, strings by [`collate`], arrays and objects by their string forms.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let fx = x.as_f64().unwrap_or(f64::NAN);
            let fy = y.as_f64().unwrap_or(f64::NAN);
            fx.total_cmp(&fy)
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::String(x), Value::String(y)) => collate(x, y),
        _ => type_rank(a).cmp(&type_rank(b)).then_with(|| collate(&stringify(a), &stringify(b))),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Number(_) => 0,
        Value::Bool(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

/// Case-insensitive primary order; on case-only differences lowercase sorts first.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn advance_cycles_three_states() {
        let s0 = SortState::default();
        let s1 = s0.advance("name");
        assert_eq!(s1, SortState::ascending("name"));
        let s2 = s1.advance("name");
        assert_eq!(s2, SortState::descending("name"));
        let s3 = s2.advance("name");
        assert_eq!(s3, s0);
        assert!(!s3.is_active());
    }

    #[test]
    fn switching_column_restarts_ascending() {
        let s = SortState::descending("name").advance("age");
        assert_eq!(s, SortState::ascending("age"));
        assert_eq!(s.direction_for("name"), SortDirection::None);
        assert_eq!(s.direction_for("age"), SortDirection::Ascending);
    }

    #[test]
    fn collate_ignores_case_first() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Banana", "apple"), Ordering::Greater);
        assert_eq!(collate("a", "A"), Ordering::Less);
        assert_eq!(collate("abc", "abc"), Ordering::Equal);
        assert_eq!(collate("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(compare_values(&json!(9), &json!(10)), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!(false), &json!(true)), Ordering::Less);
        assert_eq!(compare_values(&json!(-1), &json!(u64::MAX)), Ordering::Less);
    }

    #[test]
    fn mixed_types_rank_by_type_then_value() {
        // numbers < booleans < strings < arrays < objects
        let ladder = [
            json!(9),
            json!(10),
            json!(true),
            json!("10a"),
            json!("9"),
            json!([1]),
            json!({ "a": 1 }),
        ];
        for (i, a) in ladder.iter().enumerate() {
            for (j, b) in ladder.iter().enumerate() {
                assert_eq!(compare_values(a, b), i.cmp(&j), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn nulls_trail_in_both_directions() {
        let some = json!({ "age": 1 });
        let none = json!({ "age": null });
        let missing = json!({});
        for dir in [SortDirection::Ascending, SortDirection::Descending] {
            assert_eq!(compare_rows(&none, &some, "age", dir), Ordering::Greater);
            assert_eq!(compare_rows(&some, &missing, "age", dir), Ordering::Less);
            assert_eq!(compare_rows(&none, &missing, "age", dir), Ordering::Equal);
        }
    }

    #[test]
    fn indicators() {
        assert_eq!(SortDirection::Ascending.indicator(), " ↑");
        assert_eq!(SortDirection::Descending.indicator(), " ↓");
        assert_eq!(SortDirection::None.indicator(), "");
    }
}
