//! The visible page handed to the rendering layer.

use pmgrid_core::Row;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisiblePage<'a> {
    pub rows: Vec<&'a Row>,
    /// Position of each row in the source data, parallel to `rows`.
    #[serde(skip)]
    pub indices: Vec<usize>,
    pub current_page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<'a> VisiblePage<'a> {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// 1-based inclusive item range shown on this page, `None` when there are no items.
    pub fn item_range(&self) -> Option<(usize, usize)> {
        if self.rows.is_empty() {
            return None;
        }
        let start = (self.current_page - 1) * self.page_size + 1;
        Some((start, start + self.rows.len() - 1))
    }

    pub fn range_label(&self) -> String {
        match self.item_range() {
            Some((start, end)) => format!("Showing {}-{} of {}", start, end, self.total_items),
            None => "No records".to_string(),
        }
    }

    /// Page numbers for the pager strip: at most `window` pages around the current one.
    pub fn page_numbers(&self, window: usize) -> Vec<usize> {
        if self.total_pages == 0 || window == 0 {
            return Vec::new();
        }
        let window = window.min(self.total_pages);
        let half = window / 2;
        let mut start = self.current_page.saturating_sub(half).max(1);
        if start + window - 1 > self.total_pages {
            start = self.total_pages + 1 - window;
        }
        (start..start + window).collect()
    }
}
