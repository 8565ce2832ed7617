//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the appropriate implementations.

use std::sync::Arc;

use crate::tools::cache::{CacheInvalidateParams, invalidate_impl, status_impl};
use crate::tools::catalogue_categories::categories_impl;
use crate::tools::category_view::category_impl;
use crate::tools::inventory_view::inventory_impl;
use crate::tools::product_details::details_impl;
use crate::tools::{CategoryViewParams, InventoryViewParams, ProductDetailsParams};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use storedb_core::{BrowseOptions, Catalogue};

/// The main MCP server handler for storedb.
#[derive(Clone)]
pub struct StoreDbServer {
    tool_router: ToolRouter<Self>,
    catalogue: Arc<Catalogue>,
    options: BrowseOptions,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// This macro generates the routing logic that maps tool names to handler methods.
#[tool_router]
impl StoreDbServer {
    /// Create a new server handler over a shared catalogue.
    pub fn new(catalogue: Arc<Catalogue>, options: BrowseOptions) -> Self {
        Self { tool_router: Self::tool_router(), catalogue, options }
    }

    #[tool(
        description = "Browse the whole inventory. Filters by category slugs and free-text search, sorts by title, price or stock, and returns one page with pagination info."
    )]
    async fn inventory_view(&self, params: Parameters<InventoryViewParams>) -> Result<CallToolResult, McpError> {
        inventory_impl(&self.catalogue, &self.options, params.0).await
    }

    #[tool(
        description = "Browse a single category by slug. Search text narrows the category's products locally. Returns one sorted page."
    )]
    async fn category_view(&self, params: Parameters<CategoryViewParams>) -> Result<CallToolResult, McpError> {
        category_impl(&self.catalogue, &self.options, params.0).await
    }

    #[tool(description = "List every product category with its slug and display name.")]
    async fn catalogue_categories(&self) -> Result<CallToolResult, McpError> {
        categories_impl(&self.catalogue).await
    }

    #[tool(
        description = "Get one product by id with stock status, discounted price, and up to six similar products from its category."
    )]
    async fn product_details(&self, params: Parameters<ProductDetailsParams>) -> Result<CallToolResult, McpError> {
        details_impl(&self.catalogue, params.0).await
    }

    #[tool(description = "List cached catalogue queries with status, staleness and age.")]
    async fn cache_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.catalogue).await
    }

    #[tool(
        description = "Mark cached queries stale so they are refetched on next use. Pass a key path or fingerprint from cache_status, or omit it to invalidate everything."
    )]
    async fn cache_invalidate(&self, params: Parameters<CacheInvalidateParams>) -> Result<CallToolResult, McpError> {
        invalidate_impl(&self.catalogue, params.0).await
    }
}

impl ServerHandler for StoreDbServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "storedb".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Product catalogue browser. Start with catalogue_categories or inventory_view, then drill into \
                 category_view or product_details."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
