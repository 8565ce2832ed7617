//! Browse filter state and the filtering steps that use it.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Item;
use crate::query::{SortField, SortOrder};

/// What the operator currently asked for.
///
/// Changing the search term or the category set sends the view back to page 1,
/// since the old page number may be out of range for the new result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FilterState {
    /// Empty means no category restriction.
    pub selected_categories: BTreeSet<String>,
    pub search_term: String,
    pub sort_field: SortField,
    pub sort_order: SortOrder,
    /// 1-based.
    pub page: usize,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            selected_categories: BTreeSet::new(),
            search_term: String::new(),
            sort_field: SortField::Title,
            sort_order: SortOrder::Asc,
            page: 1,
        }
    }
}

impl FilterState {
    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    pub fn set_categories<I, S>(&mut self, slugs: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_categories = slugs.into_iter().map(Into::into).collect();
        self.page = 1;
    }

    /// Add `slug` if absent, remove it if present.
    pub fn toggle_category(&mut self, slug: &str) {
        if !self.selected_categories.remove(slug) {
            self.selected_categories.insert(slug.to_string());
        }
        self.page = 1;
    }

    /// Column-header behaviour: re-selecting the active field flips the order,
    /// a new field starts ascending.
    pub fn sort_by(&mut self, field: SortField) {
        if self.sort_field == field {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_field = field;
            self.sort_order = SortOrder::Asc;
        }
        self.page = 1;
    }

    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        self.sort_field = field;
        self.sort_order = order;
        self.page = 1;
    }

    /// Pages below 1 are raised to 1.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Trimmed search term; empty when no search is active.
    pub fn active_term(&self) -> &str {
        self.search_term.trim()
    }

    pub fn is_searching(&self) -> bool {
        !self.active_term().is_empty()
    }
}

/// Keep items whose category is selected; an empty selection keeps everything.
pub fn by_category<'a>(items: &'a [Item], selected: &BTreeSet<String>) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| selected.is_empty() || selected.contains(&item.category))
        .collect()
}

/// Narrow a listing by case-insensitive substring on title or brand.
///
/// Used by the category drill-down, which filters the by-category listing
/// locally instead of calling the search endpoint. Server order is preserved.
pub fn by_text(items: &[Item], term: &str) -> Vec<Item> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.matches_text(&needle))
        .cloned()
        .collect()
}
