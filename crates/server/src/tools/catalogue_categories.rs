//! catalogue_categories tool implementation.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::{Catalogue, Category};

use super::json_result;

/// Output from the catalogue_categories tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CategoriesOutput {
    pub categories: Vec<Category>,
}

/// Implementation of the catalogue_categories tool.
pub async fn categories_impl(catalogue: &Catalogue) -> Result<CallToolResult, McpError> {
    let categories = catalogue.categories().await.into_result()?;
    json_result(&CategoriesOutput { categories: categories.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::output_json;
    use std::sync::Arc;
    use storedb_core::fixtures::StaticCatalogue;

    #[tokio::test]
    async fn test_categories_listed_and_cached() {
        let source = Arc::new(StaticCatalogue::sample());
        let catalogue = Catalogue::new(source.clone());

        let result = categories_impl(&catalogue).await.unwrap();
        let output: CategoriesOutput = output_json(&result);
        let slugs: Vec<&str> = output.categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["beauty", "fragrances", "furniture", "groceries", "smartphones"]);

        categories_impl(&catalogue).await.unwrap();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_categories_failure_is_error() {
        let source = Arc::new(StaticCatalogue::sample());
        source.set_failing(true);
        let catalogue = Catalogue::new(source);

        assert!(categories_impl(&catalogue).await.is_err());
    }
}
