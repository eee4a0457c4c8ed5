//! Filter kinds, filter sets and the filter bar's field descriptors.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{present, stringify, Row, TableError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    /// Case-insensitive substring.
    Text,
    /// Exact string equality.
    Select,
    /// Prefix match (`"2024"`, `"2024-03"`, `"2024-03-05"`).
    Date,
}

impl FilterKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKind::Text => "text",
            FilterKind::Select => "select",
            FilterKind::Date => "date",
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FilterKind::Text),
            "select" => Ok(FilterKind::Select),
            "date" => Ok(FilterKind::Date),
            _ => Err(TableError::UnknownFilterKind(s.to_string())),
        }
    }
}

/// One `(field, value, kind)` entry of a filter set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub key: String,
    pub value: String,
    pub kind: FilterKind,
}

impl FieldFilter {
    pub fn new(key: &str, value: &str, kind: FilterKind) -> Self {
        Self { key: key.to_string(), value: value.to_string(), kind }
    }

    pub fn text(key: &str, value: &str) -> Self {
        Self::new(key, value, FilterKind::Text)
    }

    pub fn select(key: &str, value: &str) -> Self {
        Self::new(key, value, FilterKind::Select)
    }

    pub fn date(key: &str, value: &str) -> Self {
        Self::new(key, value, FilterKind::Date)
    }

    /// Null or missing fields never match.
    pub fn matches(&self, row: &Row) -> bool {
        let Some(v) = present(row, &self.key) else {
            return false;
        };
        let s = stringify(v);
        match self.kind {
            FilterKind::Text => s.to_lowercase().contains(&self.value.to_lowercase()),
            FilterKind::Select => s == self.value,
            FilterKind::Date => s.starts_with(&self.value),
        }
    }

    /// Parse `key=value[:kind]`. Kind defaults to `text`; a trailing `:suffix` that is
    /// not a known kind stays part of the value (`created=2024-03-05 10:00`).
    pub fn parse_spec(spec: &str) -> Result<Self, TableError> {
        let Some((key, rest)) = spec.split_once('=') else {
            return Err(TableError::InvalidFilterSpec(spec.to_string()));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(TableError::InvalidFilterSpec(spec.to_string()));
        }
        if let Some((value, kind)) = rest.rsplit_once(':') {
            if let Ok(kind) = kind.parse::<FilterKind>() {
                return Ok(Self::new(key, value, kind));
            }
        }
        Ok(Self::text(key, rest))
    }
}

/// Ordered filter mapping, one entry per key. A row matches when every entry matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    entries: SmallVec<[FieldFilter; 4]>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place (the entry keeps its original position).
    pub fn insert(&mut self, filter: FieldFilter) {
        match self.entries.iter_mut().find(|f| f.key == filter.key) {
            Some(slot) => *slot = filter,
            None => self.entries.push(filter),
        }
    }

    pub fn with(mut self, filter: FieldFilter) -> Self {
        self.insert(filter);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldFilter> {
        let pos = self.entries.iter().position(|f| f.key == key)?;
        Some(self.entries.remove(pos))
    }

    pub fn get(&self, key: &str) -> Option<&FieldFilter> {
        self.entries.iter().find(|f| f.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldFilter> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.entries.iter().all(|f| f.matches(row))
    }

    /// Build a filter set from filter bar inputs. Fields are visited in descriptor order;
    /// blank inputs are skipped and inputs for undeclared keys are ignored.
    pub fn from_inputs<'a>(
        fields: &[FilterField],
        inputs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let inputs: Vec<(&str, &str)> = inputs.into_iter().collect();
        let mut set = FilterSet::new();
        for f in fields {
            let Some((_, raw)) = inputs.iter().find(|(k, _)| *k == f.key) else {
                continue;
            };
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            set.insert(FieldFilter::new(&f.key, value, f.kind));
        }
        set
    }
}

impl FromIterator<FieldFilter> for FilterSet {
    fn from_iter<I: IntoIterator<Item = FieldFilter>>(iter: I) -> Self {
        let mut set = FilterSet::new();
        for f in iter {
            set.insert(f);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// Filter bar field descriptor. `options` is only meaningful for `select` fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub key: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: FilterKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
}

impl FilterField {
    pub fn new(key: &str, label: &str, kind: FilterKind) -> Self {
        Self { key: key.to_string(), label: label.to_string(), kind, options: Vec::new() }
    }

    pub fn option(mut self, value: &str, label: &str) -> Self {
        self.options.push(SelectOption { value: value.to_string(), label: label.to_string() });
        self
    }
}
