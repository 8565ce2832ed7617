//! Filter/sort/paginate engine.
//!
//! [`derive`] turns a raw collection plus a [`FilterState`] into the exact page
//! to show. It is pure and total: identical inputs give identical output, and
//! no well-formed input makes it fail.
//!
//! ### Sources
//!
//! - **Listing**: bulk or by-category listing. The server already ordered it by
//!   the requested sort field and direction; that order is kept verbatim.
//! - **Search result**: matched server-side but not sorted, so it is re-sorted
//!   locally (stable, ties keep server order).
//!
//! Category filtering applies to both.

pub mod filter;
pub mod paginate;
pub mod sort;

use schemars::JsonSchema;
use serde::Serialize;

use crate::model::Item;

pub use filter::FilterState;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// The collection a page is derived from.
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    /// Server-sorted listing; never re-sorted locally.
    Listing(&'a [Item]),
    /// Server-matched search hits; re-sorted locally.
    SearchResult(&'a [Item]),
}

impl<'a> Source<'a> {
    pub fn items(&self) -> &'a [Item] {
        match self {
            Source::Listing(items) | Source::SearchResult(items) => items,
        }
    }
}

/// One bounded page plus pagination metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, JsonSchema)]
pub struct DerivedPage {
    pub items: Vec<Item>,
    pub total_items: usize,
    pub total_pages: usize,
}

/// Derive the visible page for `filter` from `source`.
pub fn derive(source: Source<'_>, filter: &FilterState, page_size: usize) -> DerivedPage {
    let mut matched = filter::by_category(source.items(), &filter.selected_categories);

    if let Source::SearchResult(_) = source {
        sort::sort_items(&mut matched, filter.sort_field, filter.sort_order);
    }

    let total_items = matched.len();
    let total_pages = paginate::total_pages(total_items, page_size);
    let bounds = paginate::page_bounds(filter.page, page_size, total_items);
    let items = matched[bounds].iter().copied().cloned().collect();

    DerivedPage { items, total_items, total_pages }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{SortField, SortOrder};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    const CATEGORIES: [&str; 4] = ["beauty", "fragrances", "furniture", "groceries"];

    /// 194 items in the order the server returns for `sortBy=price&order=asc`.
    fn price_sorted_catalogue() -> Vec<Item> {
        let mut items: Vec<Item> = (1..=194u64)
            .map(|id| {
                let price = ((id * 37) % 500) as f64 + 0.99;
                Item::new(id, format!("Item {id}"), CATEGORIES[(id % 4) as usize], price, (id % 50) as u32)
            })
            .collect();
        items.sort_by(|a, b| a.price.total_cmp(&b.price));
        items
    }

    fn phone_hits() -> Vec<Item> {
        [(101, 12), (102, 80), (103, 3), (104, 80), (105, 0), (106, 45), (107, 19), (108, 66)]
            .into_iter()
            .map(|(id, stock)| Item::new(id, format!("Phone {id}"), "smartphones", 199.0, stock))
            .collect()
    }

    #[test]
    fn test_bulk_listing_price_ascending() {
        let items = price_sorted_catalogue();
        let filter = FilterState { sort_field: SortField::Price, sort_order: SortOrder::Asc, ..Default::default() };

        let page = derive(Source::Listing(&items), &filter, 20);

        assert_eq!(page.total_items, 194);
        assert_eq!(page.total_pages, 10);
        assert_eq!(page.items.len(), 20);
        assert!(page.items.windows(2).all(|w| w[0].price <= w[1].price));

        let mut all_prices: Vec<f64> = items.iter().map(|i| i.price).collect();
        all_prices.sort_by(f64::total_cmp);
        let page_prices: Vec<f64> = page.items.iter().map(|i| i.price).collect();
        assert_eq!(page_prices, all_prices[..20]);
    }

    #[test]
    fn test_search_result_resorted_by_stock_descending() {
        let hits = phone_hits();
        let filter = FilterState {
            search_term: "phone".into(),
            sort_field: SortField::Stock,
            sort_order: SortOrder::Desc,
            ..Default::default()
        };

        let page = derive(Source::SearchResult(&hits), &filter, 20);

        assert_eq!(page.items.len(), 8);
        assert_eq!(page.total_pages, 1);
        assert!(page.items.windows(2).all(|w| w[0].stock >= w[1].stock));
        // equal stock keeps server order
        let ties: Vec<u64> = page.items.iter().filter(|i| i.stock == 80).map(|i| i.id).collect();
        assert_eq!(ties, vec![102, 104]);
    }

    #[test]
    fn test_listing_is_not_resorted() {
        let items = vec![Item::new(1, "b", "x", 3.0, 1), Item::new(2, "a", "x", 1.0, 1)];
        let filter = FilterState { sort_field: SortField::Title, ..Default::default() };

        let page = derive(Source::Listing(&items), &filter, 20);
        let ids: Vec<u64> = page.items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_page_past_end_is_empty() {
        let items = price_sorted_catalogue();
        let filter = FilterState { page: 42, ..Default::default() };

        let page = derive(Source::Listing(&items), &filter, 20);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 10);
        assert_eq!(page.total_items, 194);
    }

    #[test]
    fn test_empty_search_result() {
        let filter = FilterState { search_term: "zzz".into(), ..Default::default() };
        let page = derive(Source::SearchResult(&[]), &filter, 20);
        assert_eq!(page, DerivedPage::default());
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec((0usize..4, 0u32..200, 0u32..100, "[a-zA-Z ]{0,12}"), 0..120).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(idx, (cat, price, stock, title))| {
                    Item::new(idx as u64 + 1, title, CATEGORIES[cat], f64::from(price) / 4.0, stock)
                })
                .collect()
        })
    }

    fn arb_filter() -> impl Strategy<Value = FilterState> {
        (
            prop::collection::btree_set(prop::sample::select(vec!["beauty", "fragrances", "furniture", "toys"]), 0..3),
            prop::sample::select(vec![SortField::Title, SortField::Price, SortField::Stock]),
            prop::bool::ANY,
            1usize..12,
        )
            .prop_map(|(cats, sort_field, desc, page)| FilterState {
                selected_categories: cats.into_iter().map(str::to_string).collect::<BTreeSet<_>>(),
                search_term: String::new(),
                sort_field,
                sort_order: if desc { SortOrder::Desc } else { SortOrder::Asc },
                page,
            })
    }

    proptest! {
        #[test]
        fn prop_selected_categories_respected(items in arb_items(), filter in arb_filter(), search in prop::bool::ANY) {
            let source = if search { Source::SearchResult(&items) } else { Source::Listing(&items) };
            let page = derive(source, &filter, DEFAULT_PAGE_SIZE);
            if filter.selected_categories.is_empty() {
                prop_assert_eq!(page.total_items, items.len());
            } else {
                prop_assert!(page.items.iter().all(|i| filter.selected_categories.contains(&i.category)));
            }
        }

        #[test]
        fn prop_page_count_matches_total(items in arb_items(), filter in arb_filter(), page_size in 1usize..30) {
            let page = derive(Source::Listing(&items), &filter, page_size);
            prop_assert_eq!(page.total_pages, page.total_items.div_ceil(page_size));
            prop_assert_eq!(page.total_pages == 0, page.total_items == 0);
            let expected_len = page.total_items.saturating_sub((filter.page - 1) * page_size).min(page_size);
            prop_assert_eq!(page.items.len(), expected_len);
        }

        #[test]
        fn prop_out_of_range_page_is_empty(items in arb_items(), filter in arb_filter()) {
            let first = derive(Source::SearchResult(&items), &FilterState { page: 1, ..filter.clone() }, DEFAULT_PAGE_SIZE);
            let beyond = FilterState { page: first.total_pages + 1 + filter.page, ..filter };
            let page = derive(Source::SearchResult(&items), &beyond, DEFAULT_PAGE_SIZE);
            prop_assert!(page.items.is_empty());
            prop_assert_eq!(page.total_pages, first.total_pages);
        }

        #[test]
        fn prop_derive_is_idempotent(items in arb_items(), filter in arb_filter(), search in prop::bool::ANY) {
            let source = if search { Source::SearchResult(&items) } else { Source::Listing(&items) };
            prop_assert_eq!(derive(source, &filter, DEFAULT_PAGE_SIZE), derive(source, &filter, DEFAULT_PAGE_SIZE));
        }

        #[test]
        fn prop_search_result_is_ordered(items in arb_items(), filter in arb_filter()) {
            let page = derive(Source::SearchResult(&items), &filter, DEFAULT_PAGE_SIZE);
            let ordered = page.items.windows(2).all(|w| {
                let ord = sort::compare(&w[0], &w[1], filter.sort_field);
                match filter.sort_order {
                    SortOrder::Asc => ord != std::cmp::Ordering::Greater,
                    SortOrder::Desc => ord != std::cmp::Ordering::Less,
                }
            });
            prop_assert!(ordered);
        }
    }
}
