//! Cached access to the remote catalogue.
//!
//! [`Catalogue`] owns one query cache per value type. All of them share a
//! single [`QueryKey`] space and a single change notifier, so a subscriber
//! sees every settled, invalidated or dropped key regardless of its type.

use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::broadcast;

use crate::Error;
use crate::cache::{EntrySummary, QueryCache, QueryState};
use crate::model::{Category, Item, ProductsPage};
use crate::query::{ListParams, QueryKey};
use crate::source::CatalogueSource;

/// Listing size used to find related products; one extra covers the excluded item.
const SIMILAR_FETCH_LIMIT: u32 = 7;
const SIMILAR_MAX: usize = 6;

const EVENT_CAPACITY: usize = 256;

/// Query layer over a [`CatalogueSource`].
///
/// Meant to be created once and shared (`Arc<Catalogue>`) by every consumer,
/// so that identical requests are deduplicated across them.
pub struct Catalogue {
    source: Arc<dyn CatalogueSource>,
    listings: QueryCache<QueryKey, ProductsPage>,
    items: QueryCache<QueryKey, Item>,
    categories: QueryCache<QueryKey, Vec<Category>>,
    events: broadcast::Sender<QueryKey>,
}

impl Catalogue {
    pub fn new(source: Arc<dyn CatalogueSource>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            source,
            listings: QueryCache::with_notifier(events.clone()),
            items: QueryCache::with_notifier(events.clone()),
            categories: QueryCache::with_notifier(events.clone()),
            events,
        }
    }

    /// Bulk product listing.
    pub async fn products(&self, params: ListParams) -> QueryState<ProductsPage> {
        self.listing(QueryKey::List { params }).await
    }

    /// Free-text search. An empty (or blank) term is rejected without a request.
    pub async fn search(&self, term: &str, limit: u32) -> QueryState<ProductsPage> {
        self.listing(QueryKey::search(term, limit)).await
    }

    pub async fn products_by_category(&self, slug: &str, params: ListParams) -> QueryState<ProductsPage> {
        self.listing(QueryKey::ByCategory { slug: slug.to_string(), params }).await
    }

    /// Any page-shaped query: bulk listing, search, or by-category listing.
    pub async fn listing(&self, key: QueryKey) -> QueryState<ProductsPage> {
        if let Err(err) = validate_listing(&key) {
            return QueryState::failed(err);
        }
        let stale_after = key.stale_after();
        let source = Arc::clone(&self.source);
        let request = key.clone();
        self.listings.get(key, stale_after, move || fetch_page(source, request)).await
    }

    /// Non-blocking form of [`Catalogue::listing`].
    pub fn ensure_listing(&self, key: QueryKey) -> QueryState<ProductsPage> {
        if let Err(err) = validate_listing(&key) {
            return QueryState::failed(err);
        }
        let stale_after = key.stale_after();
        let source = Arc::clone(&self.source);
        let request = key.clone();
        self.listings.ensure(key, stale_after, move || fetch_page(source, request))
    }

    pub async fn product(&self, id: u64) -> QueryState<Item> {
        if id == 0 {
            return QueryState::failed(Error::InvalidInput("product id must be at least 1".into()));
        }
        let key = QueryKey::ById { id };
        let stale_after = key.stale_after();
        let source = Arc::clone(&self.source);
        self.items.get(key, stale_after, move || fetch_item(source, id)).await
    }

    pub fn ensure_product(&self, id: u64) -> QueryState<Item> {
        if id == 0 {
            return QueryState::failed(Error::InvalidInput("product id must be at least 1".into()));
        }
        let key = QueryKey::ById { id };
        let stale_after = key.stale_after();
        let source = Arc::clone(&self.source);
        self.items.ensure(key, stale_after, move || fetch_item(source, id))
    }

    pub async fn categories(&self) -> QueryState<Vec<Category>> {
        let source = Arc::clone(&self.source);
        self.categories
            .get(QueryKey::Categories, QueryKey::Categories.stale_after(), move || fetch_categories(source))
            .await
    }

    pub fn ensure_categories(&self) -> QueryState<Vec<Category>> {
        let source = Arc::clone(&self.source);
        self.categories
            .ensure(QueryKey::Categories, QueryKey::Categories.stale_after(), move || fetch_categories(source))
    }

    /// Up to six other products from `slug`, excluding `exclude_id`.
    pub async fn similar_products(&self, slug: &str, exclude_id: u64) -> QueryState<Vec<Item>> {
        self.products_by_category(slug, ListParams::limited(SIMILAR_FETCH_LIMIT))
            .await
            .map(|page| {
                page.products
                    .iter()
                    .filter(|item| item.id != exclude_id)
                    .take(SIMILAR_MAX)
                    .cloned()
                    .collect()
            })
    }

    /// Issue a fresh request for `key` and wait for it.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or `InvalidInput` for keys that can never be sent.
    pub async fn refetch(&self, key: &QueryKey) -> Result<(), Error> {
        let source = Arc::clone(&self.source);
        let stale_after = key.stale_after();
        match key {
            QueryKey::ById { id } => {
                let id = *id;
                if id == 0 {
                    return Err(Error::InvalidInput("product id must be at least 1".into()));
                }
                let state = self.items.refetch(key.clone(), stale_after, move || fetch_item(source, id)).await;
                settled_result(state)
            }
            QueryKey::Categories => {
                let state = self.categories.refetch(key.clone(), stale_after, move || fetch_categories(source)).await;
                settled_result(state)
            }
            _ => {
                validate_listing(key)?;
                let request = key.clone();
                let state = self.listings.refetch(key.clone(), stale_after, move || fetch_page(source, request)).await;
                settled_result(state)
            }
        }
    }

    /// Wait for any request in flight for `key` to settle.
    pub async fn settled(&self, key: &QueryKey) {
        match key {
            QueryKey::ById { .. } => {
                self.items.settled(key).await;
            }
            QueryKey::Categories => {
                self.categories.settled(key).await;
            }
            _ => {
                self.listings.settled(key).await;
            }
        }
    }

    /// Key of the cached entry whose request path or fingerprint is `id`.
    pub fn find_key(&self, id: &str) -> Option<QueryKey> {
        self.entries()
            .into_iter()
            .map(|entry| entry.key)
            .find(|key| key.fingerprint() == id || key.to_string() == id)
    }

    /// Mark `key` stale; the last good value stays visible until the next fetch.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        match key {
            QueryKey::ById { .. } => self.items.invalidate(key),
            QueryKey::Categories => self.categories.invalidate(key),
            _ => self.listings.invalidate(key),
        }
    }

    /// Invalidate every entry. Returns how many were affected.
    pub fn invalidate_all(&self) -> usize {
        self.entries().iter().filter(|entry| self.invalidate(&entry.key)).count()
    }

    pub fn clear(&self) {
        self.listings.clear();
        self.items.clear();
        self.categories.clear();
    }

    /// Every cache entry, ordered by request path.
    pub fn entries(&self) -> Vec<EntrySummary<QueryKey>> {
        let mut entries = self.listings.entries();
        entries.extend(self.items.entries());
        entries.extend(self.categories.entries());
        entries.sort_by_cached_key(|entry| entry.key.to_string());
        entries
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueryKey> {
        self.events.subscribe()
    }
}

fn settled_result<V>(state: QueryState<V>) -> Result<(), Error> {
    match state.error {
        Some(err) => Err(err),
        None => state.into_result().map(|_| ()),
    }
}

/// Reject page-shaped keys that must never reach the remote catalogue.
fn validate_listing(key: &QueryKey) -> Result<(), Error> {
    match key {
        QueryKey::Search { term, .. } if term.trim().is_empty() => {
            Err(Error::InvalidInput("search term must not be empty".into()))
        }
        QueryKey::ByCategory { slug, .. } if slug.trim().is_empty() => {
            Err(Error::InvalidInput("category slug must not be empty".into()))
        }
        QueryKey::ById { .. } | QueryKey::Categories => {
            Err(Error::InvalidInput(format!("{key} does not return a product listing")))
        }
        _ => Ok(()),
    }
}

fn fetch_page(source: Arc<dyn CatalogueSource>, key: QueryKey) -> BoxFuture<'static, Result<ProductsPage, Error>> {
    async move {
        tracing::debug!(%key, fingerprint = %key.fingerprint(), "fetching listing");
        match &key {
            QueryKey::List { params } => source.list_products(params).await,
            QueryKey::Search { term, limit } => source.search_products(term, *limit).await,
            QueryKey::ByCategory { slug, params } => source.list_products_by_category(slug, params).await,
            QueryKey::ById { .. } | QueryKey::Categories => {
                Err(Error::InvalidInput(format!("{key} does not return a product listing")))
            }
        }
    }
    .boxed()
}

fn fetch_item(source: Arc<dyn CatalogueSource>, id: u64) -> BoxFuture<'static, Result<Item, Error>> {
    async move { source.get_product(id).await }.boxed()
}

fn fetch_categories(source: Arc<dyn CatalogueSource>) -> BoxFuture<'static, Result<Vec<Category>, Error>> {
    async move { source.list_categories().await }.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::QueryStatus;
    use crate::fixtures::StaticCatalogue;
    use crate::query::{SortField, SortOrder};
    use std::time::Duration;

    fn catalogue() -> (Arc<StaticCatalogue>, Catalogue) {
        let source = Arc::new(StaticCatalogue::sample());
        let catalogue = Catalogue::new(source.clone());
        (source, catalogue)
    }

    #[tokio::test(start_paused = true)]
    async fn test_products_are_cached_by_params() {
        let (source, catalogue) = catalogue();
        let params = ListParams::limited(194).sorted(SortField::Price, SortOrder::Asc);

        let first = catalogue.products(params.clone()).await;
        let second = catalogue.products(params.clone()).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(first.value().unwrap().products.len(), 21);
        assert_eq!(second.value().unwrap().products[0].price, 1.99);

        catalogue.products(params.sorted(SortField::Price, SortOrder::Desc)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(source.requests()[1], "products?limit=194&sortBy=price&order=desc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_search_is_never_sent() {
        let (source, catalogue) = catalogue();

        let state = catalogue.search("   ", 100).await;
        assert!(matches!(state.error, Some(Error::InvalidInput(_))));
        assert!(!state.is_loading());
        assert_eq!(source.calls(), 0);
        assert!(catalogue.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_search_matches_eight_phones() {
        let (_, catalogue) = catalogue();
        let state = catalogue.search("phone", 100).await;
        assert_eq!(state.value().unwrap().products.len(), 8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_ids_and_slugs_rejected() {
        let (source, catalogue) = catalogue();

        assert!(matches!(catalogue.product(0).await.error, Some(Error::InvalidInput(_))));
        assert!(matches!(
            catalogue.products_by_category("", ListParams::default()).await.error,
            Some(Error::InvalidInput(_))
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_product_is_not_found() {
        let (_, catalogue) = catalogue();
        let state = catalogue.product(999).await;
        assert_eq!(state.status, QueryStatus::Error);
        assert!(matches!(state.error, Some(Error::NotFound(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_similar_products_excludes_current() {
        let (source, catalogue) = catalogue();

        let state = catalogue.similar_products("beauty", 3).await;
        let ids: Vec<u64> = state.value().unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);
        assert_eq!(source.requests(), vec!["products/category/beauty?limit=7".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_categories_are_listed_once() {
        let (source, catalogue) = catalogue();

        let state = catalogue.categories().await;
        let slugs: Vec<&str> = state.value().unwrap().iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["beauty", "fragrances", "furniture", "groceries", "smartphones"]);

        catalogue.ensure_categories();
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_reports_failure_and_keeps_value() {
        let (source, catalogue) = catalogue();
        let key = QueryKey::List { params: ListParams::limited(194) };

        catalogue.listing(key.clone()).await;
        source.set_failing(true);

        let result = catalogue.refetch(&key).await;
        assert!(matches!(result, Err(Error::Network(_))));

        let state = catalogue.ensure_listing(key.clone());
        assert_eq!(state.status, QueryStatus::Error);
        assert_eq!(state.value().unwrap().products.len(), 21);

        source.set_failing(false);
        assert!(catalogue.refetch(&key).await.is_ok());
        assert_eq!(catalogue.ensure_listing(key).status, QueryStatus::Ready);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settled_waits_for_ensure() {
        let (source, catalogue) = catalogue();
        source.set_latency(Duration::from_millis(250));
        let key = QueryKey::ByCategory { slug: "furniture".into(), params: ListParams::limited(100) };

        assert!(catalogue.ensure_listing(key.clone()).is_loading());
        catalogue.settled(&key).await;
        assert_eq!(catalogue.ensure_listing(key).value().unwrap().products.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribe_sees_every_cache() {
        let (_, catalogue) = catalogue();
        let mut events = catalogue.subscribe();

        catalogue.product(1).await;
        catalogue.categories().await;
        assert_eq!(events.recv().await.unwrap(), QueryKey::ById { id: 1 });
        assert_eq!(events.recv().await.unwrap(), QueryKey::Categories);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_all_and_clear() {
        let (source, catalogue) = catalogue();

        catalogue.product(1).await;
        catalogue.search("red", 100).await;
        assert_eq!(catalogue.entries().len(), 2);
        assert_eq!(catalogue.invalidate_all(), 2);
        assert!(catalogue.entries().iter().all(|entry| entry.is_stale));

        let stale = catalogue.product(1).await;
        assert!(stale.is_fetching);
        catalogue.settled(&QueryKey::ById { id: 1 }).await;
        assert_eq!(source.calls(), 3);

        catalogue.clear();
        assert!(catalogue.entries().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_find_key_by_path_or_fingerprint() {
        let (_, catalogue) = catalogue();
        catalogue.search("red", 100).await;
        let key = QueryKey::search("red", 100);

        assert_eq!(catalogue.find_key("products/search?q=red&limit=100"), Some(key.clone()));
        assert_eq!(catalogue.find_key(&key.fingerprint()), Some(key));
        assert_eq!(catalogue.find_key("products/1"), None);
    }
}
