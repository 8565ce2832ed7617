//! category_view tool implementation.
//!
//! Drill-down into one category. Text search narrows the category listing
//! locally rather than calling the search endpoint.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::{BrowseOptions, Catalogue, Error, Scope, SortField, SortOrder, view};

use super::inventory_view::BrowseOutput;
use super::{json_result, requested_filter};

/// Input parameters for the category_view tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CategoryViewParams {
    /// Category slug, e.g. "smartphones" (required).
    pub slug: String,

    /// Case-insensitive text matched against title and brand.
    #[serde(default)]
    pub search: Option<String>,

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

/// Implementation of the category_view tool.
pub async fn category_impl(
    catalogue: &Catalogue, options: &BrowseOptions, params: CategoryViewParams,
) -> Result<CallToolResult, McpError> {
    let slug = params.slug.trim();
    if slug.is_empty() {
        return Err(Error::InvalidInput("slug cannot be empty".into()).into());
    }

    let filter = requested_filter(params.search.as_deref(), &[], params.sort_by, params.order, params.page)?;
    let scope = Scope::Category(slug.to_string());

    let view = view::load(catalogue, &scope, &filter, options).await;
    tracing::debug!(slug, status = ?view.status, total = view.total_items, "category view");

    json_result(&BrowseOutput::new(view, filter, options.page_size))
}
