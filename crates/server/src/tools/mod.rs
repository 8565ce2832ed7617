//! MCP tool implementations.
//!
//! This module contains all tools exposed by the storedb server.

pub mod cache;
pub mod catalogue_categories;
pub mod category_view;
pub mod inventory_view;
pub mod product_details;

pub use category_view::CategoryViewParams;
pub use inventory_view::InventoryViewParams;
pub use product_details::ProductDetailsParams;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;
use storedb_core::{FilterState, SortField, SortOrder};

use crate::error::ToolError;

/// Render a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::OutputFailed(format!("Failed to serialize output: {e}")))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Build the filter state a browse tool call asks for.
pub(crate) fn requested_filter(
    search: Option<&str>, categories: &[String], sort_by: Option<SortField>, order: Option<SortOrder>,
    page: Option<usize>,
) -> Result<FilterState, ToolError> {
    if page == Some(0) {
        return Err(ToolError::InvalidInput("page must be at least 1".into()));
    }
    if let Some(slug) = categories.iter().find(|slug| slug.trim().is_empty()) {
        return Err(ToolError::InvalidInput(format!("invalid category slug: {slug:?}")));
    }

    let mut filter = FilterState::default();
    filter.set_search(search.unwrap_or_default().trim());
    filter.set_categories(categories.iter().cloned());
    filter.set_sort(sort_by.unwrap_or_default(), order.unwrap_or_default());
    filter.set_page(page.unwrap_or(1));
    Ok(filter)
}

#[cfg(test)]
pub(crate) fn output_json<T: serde::de::DeserializeOwned>(result: &CallToolResult) -> T {
    let content_val = serde_json::to_value(&result.content[0]).unwrap();
    let text = content_val
        .get("text")
        .and_then(|v| v.as_str())
        .expect("Expected text field in content");
    serde_json::from_str(text).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_filter_defaults() {
        let filter = requested_filter(None, &[], None, None, None).unwrap();
        assert_eq!(filter, FilterState::default());
    }

    #[test]
    fn test_requested_filter_rejects_page_zero() {
        assert!(matches!(requested_filter(None, &[], None, None, Some(0)), Err(ToolError::InvalidInput(_))));
        assert!(requested_filter(None, &[" ".into()], None, None, None).is_err());
    }

    #[test]
    fn test_requested_filter_keeps_page() {
        let filter = requested_filter(Some(" phone "), &["smartphones".into()], Some(SortField::Stock), None, Some(3))
            .unwrap();
        assert_eq!(filter.page, 3);
        assert_eq!(filter.search_term, "phone");
        assert_eq!(filter.sort_order, SortOrder::Asc);
        assert!(filter.selected_categories.contains("smartphones"));
    }
}
