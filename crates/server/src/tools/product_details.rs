//! product_details tool implementation.
//!
//! Fetches a single product by id, optionally with up to six other products
//! from the same category.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::{Catalogue, Item, StockStatus};

use super::json_result;

/// Parameters for the product_details tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductDetailsParams {
    /// Product id (1 or greater).
    pub id: u64,

    /// Include related products from the same category (default: true).
    #[serde(default = "default_include_similar")]
    pub include_similar: bool,
}

fn default_include_similar() -> bool {
    true
}

/// Output from the product_details tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ProductDetailsOutput {
    pub product: Item,
    pub stock_status: StockStatus,
    /// Price after the listed discount.
    pub discounted_price: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub similar: Vec<Item>,
}

/// Implementation of the product_details tool.
pub async fn details_impl(catalogue: &Catalogue, params: ProductDetailsParams) -> Result<CallToolResult, McpError> {
    let product = catalogue.product(params.id).await.into_result()?;

    let similar = if params.include_similar {
        match catalogue.similar_products(&product.category, product.id).await.into_result() {
            Ok(items) => items.to_vec(),
            Err(err) => {
                tracing::warn!(id = product.id, error = %err, "similar products unavailable");
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let output = ProductDetailsOutput {
        stock_status: product.stock_status(),
        discounted_price: product.discounted_price(),
        product: (*product).clone(),
        similar,
    };
    json_result(&output)
}
