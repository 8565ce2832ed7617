//! What a browse screen shows, computed from the cache and a [`FilterState`].

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::cache::QueryState;
use crate::catalogue::Catalogue;
use crate::config::AppConfig;
use crate::debounce::DEFAULT_QUIET_PERIOD;
use crate::engine::filter::by_text;
use crate::engine::{self, DEFAULT_PAGE_SIZE, DerivedPage, FilterState, Source};
use crate::model::ProductsPage;
use crate::query::{ListParams, QueryKey};

/// Which listing a browse screen is built on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The whole catalogue, fetched in bulk and filtered locally; text search
    /// goes to the remote search endpoint.
    Inventory,
    /// One category's listing; text search narrows it locally.
    Category(String),
}

/// Request sizing and paging for browse screens.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowseOptions {
    pub page_size: usize,
    pub debounce: Duration,
    pub inventory_limit: u32,
    pub category_limit: u32,
    pub search_limit: u32,
}

impl Default for BrowseOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            debounce: DEFAULT_QUIET_PERIOD,
            inventory_limit: 194,
            category_limit: 100,
            search_limit: 100,
        }
    }
}

impl From<&AppConfig> for BrowseOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            page_size: config.page_size,
            debounce: config.debounce(),
            inventory_limit: config.inventory_limit,
            category_limit: config.category_limit,
            search_limit: config.search_limit,
        }
    }
}

/// Coarse summary of a [`ViewState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ViewStatus {
    /// Nothing to show yet.
    Loading,
    /// Nothing to show and the request failed.
    Failed,
    /// Settled with zero matching items.
    Empty,
    Ready,
}

/// Everything a view binding renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub items: Vec<crate::model::Item>,
    pub total_items: usize,
    pub total_pages: usize,
    pub page: usize,
    pub is_loading: bool,
    pub error_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// A newer result is being fetched behind the one shown.
    pub is_refreshing: bool,
    pub status: ViewStatus,
}

impl ViewState {
    /// 1-based inclusive range of the items shown, or `None` for an empty page.
    pub fn shown_range(&self, page_size: usize) -> Option<(usize, usize)> {
        if self.items.is_empty() {
            return None;
        }
        let first = (self.page - 1) * page_size + 1;
        Some((first, first + self.items.len() - 1))
    }
}

/// The listing key a screen depends on.
pub fn listing_key(scope: &Scope, filter: &FilterState, options: &BrowseOptions) -> QueryKey {
    match scope {
        Scope::Inventory => QueryKey::List {
            params: ListParams::limited(options.inventory_limit).sorted(filter.sort_field, filter.sort_order),
        },
        Scope::Category(slug) => QueryKey::ByCategory {
            slug: slug.clone(),
            params: ListParams::limited(options.category_limit).sorted(filter.sort_field, filter.sort_order),
        },
    }
}

/// The remote search key, when the scope searches remotely and a term is active.
pub fn search_key(scope: &Scope, filter: &FilterState, options: &BrowseOptions) -> Option<QueryKey> {
    match scope {
        Scope::Inventory if filter.is_searching() => Some(QueryKey::search(filter.active_term(), options.search_limit)),
        _ => None,
    }
}

/// Every key the screen reads.
pub fn keys(scope: &Scope, filter: &FilterState, options: &BrowseOptions) -> Vec<QueryKey> {
    let mut keys = vec![listing_key(scope, filter, options)];
    keys.extend(search_key(scope, filter, options));
    keys
}

/// Non-blocking snapshot. Starts whatever fetches are missing or stale.
///
/// The inventory listing is kept warm even while a search is shown, so that
/// clearing the search has something to show at once.
pub fn peek(catalogue: &Catalogue, scope: &Scope, filter: &FilterState, options: &BrowseOptions) -> ViewState {
    let listing = catalogue.ensure_listing(listing_key(scope, filter, options));
    let page_size = options.page_size;

    match (scope, search_key(scope, filter, options)) {
        (Scope::Inventory, Some(key)) => {
            let hits = catalogue.ensure_listing(key);
            compose(&hits, filter.page, |page| engine::derive(Source::SearchResult(&page.products), filter, page_size))
        }
        (Scope::Inventory, None) => {
            compose(&listing, filter.page, |page| engine::derive(Source::Listing(&page.products), filter, page_size))
        }
        (Scope::Category(_), _) => compose(&listing, filter.page, |page| {
            let narrowed = by_text(&page.products, filter.active_term());
            engine::derive(Source::Listing(&narrowed), filter, page_size)
        }),
    }
}

/// Like [`peek`], but waits for outstanding fetches of the screen's keys first.
///
/// A recently failed entry is not retried until its backoff elapses; the
/// returned view carries the error instead.
pub async fn load(catalogue: &Catalogue, scope: &Scope, filter: &FilterState, options: &BrowseOptions) -> ViewState {
    peek(catalogue, scope, filter, options);
    for key in keys(scope, filter, options) {
        catalogue.settled(&key).await;
    }
    peek(catalogue, scope, filter, options)
}

fn compose(
    state: &QueryState<ProductsPage>, page: usize, derive: impl FnOnce(&ProductsPage) -> DerivedPage,
) -> ViewState {
    let derived = state.value().map(derive).unwrap_or_default();
    let status = match (state.value.is_some(), state.has_error()) {
        (true, _) if derived.total_items == 0 => ViewStatus::Empty,
        (true, _) => ViewStatus::Ready,
        (false, true) => ViewStatus::Failed,
        (false, false) => ViewStatus::Loading,
    };

    ViewState {
        items: derived.items,
        total_items: derived.total_items,
        total_pages: derived.total_pages,
        page,
        is_loading: state.is_loading(),
        error_present: state.has_error(),
        error: state.error.as_ref().map(ToString::to_string),
        is_refreshing: state.is_fetching && state.value.is_some(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::fixtures::StaticCatalogue;
    use crate::query::{SortField, SortOrder};
    use std::sync::Arc;

    fn setup() -> (Arc<StaticCatalogue>, Catalogue) {
        let source = Arc::new(StaticCatalogue::sample());
        (source.clone(), Catalogue::new(source))
    }

    #[test]
    fn test_keys_follow_sort_and_scope() {
        let options = BrowseOptions::default();
        let filter = FilterState { sort_field: SortField::Stock, sort_order: SortOrder::Desc, ..Default::default() };

        assert_eq!(
            listing_key(&Scope::Inventory, &filter, &options).to_string(),
            "products?limit=194&sortBy=stock&order=desc"
        );
        assert_eq!(
            listing_key(&Scope::Category("beauty".into()), &filter, &options).to_string(),
            "products/category/beauty?limit=100&sortBy=stock&order=desc"
        );
        assert!(search_key(&Scope::Inventory, &filter, &options).is_none());
    }

    #[test]
    fn test_category_scope_never_searches_remotely() {
        let options = BrowseOptions::default();
        let filter = FilterState { search_term: "red".into(), ..Default::default() };
        assert!(search_key(&Scope::Category("beauty".into()), &filter, &options).is_none());
        assert_eq!(search_key(&Scope::Inventory, &filter, &options), Some(QueryKey::search("red", 100)));
        assert_eq!(keys(&Scope::Inventory, &filter, &options).len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_peek_then_load() {
        let (_, catalogue) = setup();
        let options = BrowseOptions { page_size: 5, ..Default::default() };
        let filter = FilterState::default();

        let first = peek(&catalogue, &Scope::Inventory, &filter, &options);
        assert_eq!(first.status, ViewStatus::Loading);
        assert!(first.is_loading);
        assert!(first.items.is_empty());

        let view = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(view.status, ViewStatus::Ready);
        assert_eq!(view.total_items, 21);
        assert_eq!(view.total_pages, 5);
        assert_eq!(view.items.len(), 5);
        assert_eq!(view.items[0].title, "Annibale Colombo Bed");
        assert_eq!(view.shown_range(5), Some((1, 5)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inventory_search_is_resorted() {
        let (_, catalogue) = setup();
        let options = BrowseOptions::default();
        let filter = FilterState {
            search_term: "phone".into(),
            sort_field: SortField::Stock,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };

        let view = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(view.items.len(), 8);
        assert!(view.items.windows(2).all(|w| w[0].stock >= w[1].stock));
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_text_filter_is_local() {
        let (source, catalogue) = setup();
        let options = BrowseOptions::default();
        let filter = FilterState { search_term: "RED".into(), ..Default::default() };

        let view = load(&catalogue, &Scope::Category("beauty".into()), &filter, &options).await;
        let ids: Vec<u64> = view.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![4, 5]);
        assert!(source.requests().iter().all(|r| !r.contains("search")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listing_has_error_flag() {
        let (source, catalogue) = setup();
        source.set_failing(true);

        let view = load(&catalogue, &Scope::Inventory, &FilterState::default(), &BrowseOptions::default()).await;
        assert_eq!(view.status, ViewStatus::Failed);
        assert!(view.error_present);
        assert!(!view.is_loading);
        assert!(view.error.as_deref().is_some_and(|e| e.starts_with("NETWORK_FAILURE")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_search_result_is_empty_status() {
        let (_, catalogue) = setup();
        let filter = FilterState { search_term: "zzz".into(), ..Default::default() };

        let view = load(&catalogue, &Scope::Inventory, &filter, &BrowseOptions::default()).await;
        assert_eq!(view.status, ViewStatus::Empty);
        assert_eq!(view.total_pages, 0);
        assert!(!view.error_present);
    }

    #[test]
    fn test_compose_keeps_value_beside_error() {
        let mut state = QueryState::failed(Error::Network("status 500".into()));
        let products = StaticCatalogue::sample().items().to_vec();
        state.value = Some(Arc::new(ProductsPage { products, ..Default::default() }));

        let view = compose(&state, 1, |page| {
            engine::derive(Source::Listing(&page.products), &FilterState::default(), 20)
        });
        assert_eq!(view.status, ViewStatus::Ready);
        assert!(view.error_present);
        assert_eq!(view.items.len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_listing_recovers_on_later_load() {
        let (source, catalogue) = setup();
        let (filter, options) = (FilterState::default(), BrowseOptions::default());
        source.set_failing(true);

        let failed = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(failed.status, ViewStatus::Failed);

        source.set_failing(false);
        tokio::time::advance(std::time::Duration::from_secs(3_600)).await;
        let view = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(view.status, ViewStatus::Ready);
        assert!(!view.error_present);
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_recovers_from_failed_refresh() {
        let (source, catalogue) = setup();
        let (filter, options) = (FilterState::default(), BrowseOptions::default());

        load(&catalogue, &Scope::Inventory, &filter, &options).await;
        tokio::time::advance(std::time::Duration::from_secs(301)).await;
        source.set_failing(true);
        let stale = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(stale.status, ViewStatus::Ready);
        assert!(stale.error_present);

        source.set_failing(false);
        catalogue.invalidate(&listing_key(&Scope::Inventory, &filter, &options));
        let view = load(&catalogue, &Scope::Inventory, &filter, &options).await;
        assert_eq!(view.status, ViewStatus::Ready);
        assert!(!view.error_present);
        assert_eq!(source.calls(), 3);
    }
}
