//! cache_invalidate tool implementation.
//!
//! Marks cached queries stale so the next read refetches them. Values stay
//! visible until the refetch settles.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::Catalogue;

use crate::tools::json_result;

/// Parameters for the cache_invalidate tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateParams {
    /// Request path or fingerprint of one entry, as reported by cache_status.
    /// Omit to invalidate everything.
    #[serde(default)]
    pub key: Option<String>,
}

/// Output from the cache_invalidate tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheInvalidateOutput {
    /// Number of entries marked stale.
    pub invalidated: usize,
}

/// Implementation of the cache_invalidate tool.
pub async fn invalidate_impl(catalogue: &Catalogue, params: CacheInvalidateParams) -> Result<CallToolResult, McpError> {
    let invalidated = match params.key.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => catalogue
            .find_key(id)
            .map_or(0, |key| usize::from(catalogue.invalidate(&key))),
        _ => catalogue.invalidate_all(),
    };

    tracing::info!(key = ?params.key, invalidated, "cache invalidated");
    json_result(&CacheInvalidateOutput { invalidated })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::output_json;
    use std::sync::Arc;
    use storedb_core::fixtures::StaticCatalogue;
    use storedb_core::{ListParams, QueryKey};

    async fn warm() -> (Arc<StaticCatalogue>, Catalogue) {
        let source = Arc::new(StaticCatalogue::sample());
        let catalogue = Catalogue::new(source.clone());
        catalogue.product(1).await;
        catalogue.product(2).await;
        catalogue.products(ListParams::limited(10)).await;
        (source, catalogue)
    }

    #[tokio::test]
    async fn test_invalidate_one_path() {
        let (source, catalogue) = warm().await;
        let params = CacheInvalidateParams { key: Some("products/2".into()) };

        let result = invalidate_impl(&catalogue, params).await.unwrap();
        let output: CacheInvalidateOutput = output_json(&result);
        assert_eq!(output.invalidated, 1);

        catalogue.product(1).await;
        assert_eq!(source.calls(), 3);
        let state = catalogue.product(2).await;
        assert!(state.value.is_some());
        catalogue.settled(&QueryKey::ById { id: 2 }).await;
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_invalidate_by_fingerprint() {
        let (_, catalogue) = warm().await;
        let key = QueryKey::List { params: ListParams::limited(10) };
        let params = CacheInvalidateParams { key: Some(key.fingerprint()) };

        let result = invalidate_impl(&catalogue, params).await.unwrap();
        let output: CacheInvalidateOutput = output_json(&result);
        assert_eq!(output.invalidated, 1);

        let stale: Vec<String> =
            catalogue.entries().into_iter().filter(|e| e.is_stale).map(|e| e.key.to_string()).collect();
        assert_eq!(stale, vec!["products?limit=10".to_string()]);
    }

    #[tokio::test]
    async fn test_invalidate_everything() {
        let (_, catalogue) = warm().await;

        let result = invalidate_impl(&catalogue, CacheInvalidateParams::default()).await.unwrap();
        let output: CacheInvalidateOutput = output_json(&result);
        assert_eq!(output.invalidated, 3);
        assert!(catalogue.entries().iter().all(|e| e.is_stale));
    }

    #[tokio::test]
    async fn test_unknown_key_invalidates_nothing() {
        let (_, catalogue) = warm().await;
        let params = CacheInvalidateParams { key: Some("products/99".into()) };

        let result = invalidate_impl(&catalogue, params).await.unwrap();
        let output: CacheInvalidateOutput = output_json(&result);
        assert_eq!(output.invalidated, 0);
    }
}
