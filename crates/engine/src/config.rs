//! Table configuration: defaults plus `PMGRID_*` environment overrides.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub page_size: usize,
    /// Choices offered by the page size selector.
    pub page_size_options: Vec<usize>,
    /// Display text for null or missing cells.
    pub null_label: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            page_size_options: vec![10, 20, 50, 100],
            null_label: "-".to_string(),
        }
    }
}

impl TableConfig {
    /// Defaults overridden by `PMGRID_PAGE_SIZE` and `PMGRID_PAGE_SIZES` (comma-separated).
    pub fn from_env() -> Self {
        let page_size = std::env::var("PMGRID_PAGE_SIZE").ok();
        let options = std::env::var("PMGRID_PAGE_SIZES").ok();
        Self::default().with_overrides(page_size.as_deref(), options.as_deref())
    }

    /// Unparsable or zero values are ignored.
    pub fn with_overrides(mut self, page_size: Option<&str>, options: Option<&str>) -> Self {
        if let Some(n) = page_size.and_then(|s| s.trim().parse::<usize>().ok()).filter(|n| *n > 0) {
            self.page_size = n;
        }
        if let Some(raw) = options {
            let parsed: Vec<usize> = raw
                .split(',')
                .filter_map(|s| s.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .collect();
            if !parsed.is_empty() {
                self.page_size_options = parsed;
            }
        }
        self
    }
}
