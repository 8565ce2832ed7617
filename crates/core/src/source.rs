//! The remote catalogue as seen by the query layer.

use async_trait::async_trait;

use crate::Error;
use crate::model::{Category, Item, ProductsPage};
use crate::query::ListParams;

/// Logical catalogue operations.
///
/// Implementations must eventually resolve or reject every call; the query
/// cache applies no timeout of its own.
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    /// Bulk listing, sorted server-side when `sort_by`/`order` are given.
    async fn list_products(&self, params: &ListParams) -> Result<ProductsPage, Error>;

    async fn get_product(&self, id: u64) -> Result<Item, Error>;

    /// Free-text search. Results are matched but not sorted.
    async fn search_products(&self, term: &str, limit: u32) -> Result<ProductsPage, Error>;

    async fn list_categories(&self) -> Result<Vec<Category>, Error>;

    async fn list_products_by_category(&self, slug: &str, params: &ListParams) -> Result<ProductsPage, Error>;
}
