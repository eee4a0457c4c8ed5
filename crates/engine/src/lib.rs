//! pmgrid engine: filter, sort and paginate an in-memory row set.
//!
//! Pipeline, recomputed from scratch on every state change:
//! `source -> filters + quick search -> stable sort -> page slice`.
//! Rows are never cloned or mutated; the engine keeps indices into the source.

#![forbid(unsafe_code)]

use std::collections::BTreeSet;
use std::time::Instant;

use pmgrid_core::columns::{column_by_key, ColumnSpec, FormatterRegistry};
use pmgrid_core::filter::FilterSet;
use pmgrid_core::{field, stringify, Row, TableError, TableResult};
use serde_json::Value;
use tracing::{debug, warn};

pub mod config;
pub mod events;
pub mod page;
pub mod sort;

pub use config::TableConfig;
pub use events::{ListenerId, TableEvent};
pub use page::VisiblePage;
pub use sort::{SortDirection, SortState};

use events::Listeners;

pub struct TableEngine {
    config: TableConfig,
    columns: Vec<ColumnSpec>,
    source: Vec<Row>,
    // Indices into `source` in display order.
    filtered: Vec<usize>,
    filters: FilterSet,
    // Lowercased quick-search needle.
    search: Option<String>,
    sort: SortState,
    page_size: usize,
    current_page: usize,
    selected: BTreeSet<usize>,
    listeners: Listeners,
}

impl Default for TableEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TableEngine {
    pub fn new() -> Self {
        Self::with_config(TableConfig::default())
    }

    pub fn with_config(config: TableConfig) -> Self {
        let page_size = config.page_size.max(1);
        Self {
            config,
            columns: Vec::new(),
            source: Vec::new(),
            filtered: Vec::new(),
            filters: FilterSet::default(),
            search: None,
            sort: SortState::default(),
            page_size,
            current_page: 1,
            selected: BTreeSet::new(),
            listeners: Listeners::default(),
        }
    }

    /// Register column descriptors. Sorting then only accepts declared, sortable keys,
    /// and quick search scans these keys instead of every top-level field.
    pub fn with_columns(mut self, columns: Vec<ColumnSpec>) -> Self {
        self.columns = columns;
        self
    }

    pub fn set_columns(&mut self, columns: Vec<ColumnSpec>) {
        self.columns = columns;
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    // ---------------- data ----------------

    /// Replace the source rows. Active filters, search and sort are reapplied to the
    /// new rows; the page resets to 1 and the selection is cleared.
    pub fn set_data(&mut self, rows: Vec<Row>) {
        self.source = rows;
        self.selected.clear();
        self.current_page = 1;
        self.recompute();
        let total = self.source.len();
        debug!(total, filtered = self.filtered.len(), "data replaced");
        self.listeners.emit(&TableEvent::DataReplaced { total });
    }

    /// Load from a JSON value: an array is the row set, anything else (null included)
    /// is an empty one.
    pub fn set_data_json(&mut self, value: Value) {
        match value {
            Value::Array(rows) => self.set_data(rows),
            _ => self.set_data(Vec::new()),
        }
    }

    pub fn source_rows(&self) -> &[Row] {
        &self.source
    }

    /// Rows that passed filtering, in display order.
    pub fn filtered_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.filtered.iter().map(|&i| &self.source[i])
    }

    pub fn filtered_len(&self) -> usize {
        self.filtered.len()
    }

    // ---------------- filtering ----------------

    pub fn apply_filter(&mut self, filters: FilterSet) {
        self.filters = filters;
        self.current_page = 1;
        self.recompute();
        debug!(filters = self.filters.len(), filtered = self.filtered.len(), "filter applied");
        self.listeners.emit(&TableEvent::FilterChanged(self.filters.clone()));
    }

    pub fn reset_filter(&mut self) {
        self.apply_filter(FilterSet::default());
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Quick search: case-insensitive substring over every column value, ANDed with
    /// the filters. A blank query turns it off.
    pub fn set_search(&mut self, query: &str) {
        let q = query.trim();
        self.search = if q.is_empty() { None } else { Some(q.to_lowercase()) };
        self.current_page = 1;
        self.recompute();
        self.listeners.emit(&TableEvent::SearchChanged(self.search.clone()));
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    // ---------------- sorting ----------------

    /// Advance the sort cycle for `key`. Unknown or unsortable columns are ignored when
    /// columns are registered. Clearing the sort restores source order within the
    /// current filter.
    pub fn sort(&mut self, key: &str) -> &SortState {
        if !self.columns.is_empty() {
            match column_by_key(&self.columns, key) {
                Some(c) if !c.sortable => {
                    warn!(column = %key, "sort ignored: column is not sortable");
                    return &self.sort;
                }
                None => {
                    warn!(column = %key, "sort ignored: unknown column");
                    return &self.sort;
                }
                Some(_) => {}
            }
        }
        self.sort = self.sort.advance(key);
        self.recompute();
        debug!(column = ?self.sort.column, direction = ?self.sort.direction, "sort changed");
        self.listeners.emit(&TableEvent::SortChanged(self.sort.clone()));
        &self.sort
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    // ---------------- paging ----------------

    pub fn total_pages(&self) -> usize {
        self.filtered.len().div_ceil(self.page_size)
    }

    /// Move to `page` if it lies in `[1, max(1, total_pages)]`. Out-of-range requests
    /// are ignored and return `false`.
    pub fn go_to_page(&mut self, page: usize) -> bool {
        let last = self.total_pages().max(1);
        if page < 1 || page > last {
            metrics::counter!("table_page_requests_ignored_total", 1u64);
            debug!(page, last, "page request out of range");
            return false;
        }
        if page != self.current_page {
            self.current_page = page;
            self.emit_page();
        }
        true
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.current_page > 1 && self.go_to_page(self.current_page - 1)
    }

    pub fn change_page_size(&mut self, size: usize) -> TableResult<()> {
        if size == 0 {
            return Err(TableError::InvalidPageSize(size));
        }
        self.page_size = size;
        self.current_page = 1;
        self.emit_page();
        Ok(())
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn visible_page(&self) -> VisiblePage<'_> {
        let start = ((self.current_page - 1) * self.page_size).min(self.filtered.len());
        let end = (start + self.page_size).min(self.filtered.len());
        let indices = self.filtered[start..end].to_vec();
        VisiblePage {
            rows: indices.iter().map(|&i| &self.source[i]).collect(),
            indices,
            current_page: self.current_page,
            page_size: self.page_size,
            total_items: self.filtered.len(),
            total_pages: self.total_pages(),
        }
    }

    // ---------------- selection ----------------

    /// Toggle the checkbox of the row at `index` in the source. Returns the new state;
    /// out-of-range indices are ignored.
    pub fn toggle_selected(&mut self, index: usize) -> bool {
        if index >= self.source.len() {
            return false;
        }
        if self.selected.remove(&index) {
            false
        } else {
            self.selected.insert(index);
            true
        }
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.contains(&index)
    }

    /// Header checkbox: select every row on the current page.
    pub fn select_visible(&mut self) {
        let page = self.visible_page().indices;
        self.selected.extend(page);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected rows in source order.
    pub fn selected_rows(&self) -> Vec<&Row> {
        self.selected.iter().map(|&i| &self.source[i]).collect()
    }

    // ---------------- rendering helpers ----------------

    /// Display strings for `row`, one per registered column; null cells use the
    /// configured null label.
    pub fn render_row(&self, row: &Row, registry: &FormatterRegistry) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.render(row, registry).unwrap_or_else(|| self.config.null_label.clone()))
            .collect()
    }

    /// Column titles with sort indicators.
    pub fn header_labels(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| format!("{}{}", c.title, self.sort.direction_for(&c.key).indicator()))
            .collect()
    }

    // ---------------- listeners ----------------

    pub fn subscribe<F>(&mut self, f: F) -> ListenerId
    where
        F: FnMut(&TableEvent) + 'static,
    {
        self.listeners.add(Box::new(f))
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ---------------- pipeline ----------------

    fn recompute(&mut self) {
        let started = Instant::now();
        let mut filtered: Vec<usize> = (0..self.source.len())
            .filter(|&i| self.row_passes(&self.source[i]))
            .collect();
        if let (Some(key), direction) = (self.sort.column.as_deref(), self.sort.direction) {
            if direction != SortDirection::None {
                let source = &self.source;
                filtered.sort_by(|&a, &b| {
                    sort::compare_rows(&source[a], &source[b], key, direction)
                });
            }
        }
        self.filtered = filtered;
        let last = self.total_pages().max(1);
        if self.current_page > last {
            self.current_page = last;
        }
        metrics::gauge!("table_rows_filtered", self.filtered.len() as f64);
        metrics::histogram!("table_recompute_ms", started.elapsed().as_secs_f64() * 1_000.0);
    }

    fn row_passes(&self, row: &Row) -> bool {
        if !self.filters.matches(row) {
            return false;
        }
        match &self.search {
            Some(needle) => {
                self.search_haystack(row).any(|s| s.to_lowercase().contains(needle.as_str()))
            }
            None => true,
        }
    }

    fn search_haystack<'r>(&'r self, row: &'r Row) -> Box<dyn Iterator<Item = String> + 'r> {
        if self.columns.is_empty() {
            match row {
                Value::Object(map) => {
                    Box::new(map.values().filter(|v| !v.is_null()).map(stringify))
                }
                _ => Box::new(std::iter::empty()),
            }
        } else {
            Box::new(
                self.columns
                    .iter()
                    .filter_map(move |c| field(row, &c.key))
                    .filter(|v| !v.is_null())
                    .map(stringify),
            )
        }
    }

    fn emit_page(&mut self) {
        let (page, page_size) = (self.current_page, self.page_size);
        self.listeners.emit(&TableEvent::PageChanged { page, page_size });
    }
}
