//! inventory_view tool implementation.
//!
//! Shows one page of the whole catalogue, filtered by category and text and
//! sorted by title, price or stock.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::{BrowseOptions, Catalogue, FilterState, Scope, SortField, SortOrder, ViewState, view};

use super::{json_result, requested_filter};

/// Input parameters for the inventory_view tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct InventoryViewParams {
    /// Free-text search on title and brand. Empty shows the whole catalogue.
    #[serde(default)]
    pub search: Option<String>,

    /// Category slugs to keep. Empty keeps every category.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Sort field: title (default), price, or stock.
    #[serde(default)]
    pub sort_by: Option<SortField>,

    /// Sort order: asc (default) or desc.
    #[serde(default)]
    pub order: Option<SortOrder>,

    /// 1-based page number (default 1).
    #[serde(default)]
    pub page: Option<usize>,
}

/// Output shared by the browse tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BrowseOutput {
    /// The page to show, with pagination and loading/error flags.
    pub view: ViewState,
    /// Filter state the page was computed from.
    pub filter: FilterState,
    /// Items per page.
    pub page_size: usize,
    /// "Showing a-b of N items", absent when the page is empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showing: Option<String>,
}

impl BrowseOutput {
    pub fn new(view: ViewState, filter: FilterState, page_size: usize) -> Self {
        let showing = view
            .shown_range(page_size)
            .map(|(first, last)| format!("Showing {first}-{last} of {} items", view.total_items));
        Self { view, filter, page_size, showing }
    }
}

/// Implementation of the inventory_view tool.
pub async fn inventory_impl(
    catalogue: &Catalogue, options: &BrowseOptions, params: InventoryViewParams,
) -> Result<CallToolResult, McpError> {
    let filter =
        requested_filter(params.search.as_deref(), &params.categories, params.sort_by, params.order, params.page)?;

    let view = view::load(catalogue, &Scope::Inventory, &filter, options).await;
    tracing::debug!(status = ?view.status, total = view.total_items, page = filter.page, "inventory view");

    json_result(&BrowseOutput::new(view, filter, options.page_size))
}
