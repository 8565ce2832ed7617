//! cache_status tool implementation.
//!
//! Lists every cached query with its lifecycle and freshness.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use storedb_core::{Catalogue, QueryStatus};

use crate::tools::json_result;

/// One cached query.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheEntryOutput {
    /// Request path the entry is keyed by, e.g. `products/search?q=phone&limit=100`.
    pub key: String,
    /// SHA-256 of the key, accepted by cache_invalidate.
    pub fingerprint: String,
    pub status: QueryStatus,
    pub has_value: bool,
    pub is_fetching: bool,
    pub is_stale: bool,
    pub generation: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    pub stale_after_ms: u64,
    /// RFC 3339 timestamp of the last successful fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Output from the cache_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatusOutput {
    pub entries: Vec<CacheEntryOutput>,
}

/// Implementation of the cache_status tool.
pub async fn status_impl(catalogue: &Catalogue) -> Result<CallToolResult, McpError> {
    let entries = catalogue
        .entries()
        .into_iter()
        .map(|entry| CacheEntryOutput {
            key: entry.key.to_string(),
            fingerprint: entry.key.fingerprint(),
            status: entry.status,
            has_value: entry.has_value,
            is_fetching: entry.is_fetching,
            is_stale: entry.is_stale,
            generation: entry.generation,
            age_ms: entry.age.map(|age| age.as_millis() as u64),
            stale_after_ms: entry.stale_after.as_millis() as u64,
            fetched_at: entry.fetched_at.map(|at| at.to_rfc3339()),
            error: entry.error,
        })
        .collect();

    json_result(&CacheStatusOutput { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::output_json;
    use std::sync::Arc;
    use storedb_core::ListParams;
    use storedb_core::fixtures::StaticCatalogue;

    #[tokio::test]
    async fn test_status_lists_entries_by_path() {
        let catalogue = Catalogue::new(Arc::new(StaticCatalogue::sample()));
        catalogue.product(4).await;
        catalogue.products(ListParams::limited(194)).await;

        let result = status_impl(&catalogue).await.unwrap();
        let output: CacheStatusOutput = output_json(&result);

        let keys: Vec<&str> = output.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["products/4", "products?limit=194"]);
        assert!(output.entries.iter().all(|e| e.status == QueryStatus::Ready && e.has_value));
        assert_eq!(output.entries[0].stale_after_ms, 300_000);
        assert_eq!(output.entries[0].fingerprint.len(), 64);
    }

    #[tokio::test]
    async fn test_status_reports_errors() {
        let source = Arc::new(StaticCatalogue::sample());
        source.set_failing(true);
        let catalogue = Catalogue::new(source);
        catalogue.categories().await;

        let result = status_impl(&catalogue).await.unwrap();
        let output: CacheStatusOutput = output_json(&result);

        assert_eq!(output.entries.len(), 1);
        assert_eq!(output.entries[0].status, QueryStatus::Error);
        assert!(output.entries[0].error.is_some());
    }
}
