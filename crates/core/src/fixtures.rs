//! In-memory catalogue for tests.
//!
//! Behaves like the remote listing endpoints closely enough for the query
//! layer: listings honour `sortBy`/`order`/`skip`/`limit`, search matches title
//! or brand without sorting, and every call is counted.

use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::Error;
use crate::engine::sort;
use crate::model::{Category, Item, ProductsPage};
use crate::query::{ListParams, QueryKey, SortField, SortOrder};
use crate::source::CatalogueSource;

/// Fixed product set served from memory.
#[derive(Debug, Default)]
pub struct StaticCatalogue {
    items: Vec<Item>,
    latency: Mutex<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
    requests: Mutex<Vec<String>>,
}

impl StaticCatalogue {
    pub fn new(items: Vec<Item>) -> Self {
        Self { items, ..Default::default() }
    }

    /// A small mixed catalogue: beauty, fragrances, furniture, groceries and
    /// eight smartphones whose titles contain "phone".
    pub fn sample() -> Self {
        let mut items = vec![
            Item::new(1, "Essence Mascara Lash Princess", "beauty", 9.99, 99).with_brand("Essence"),
            Item::new(2, "Eyeshadow Palette with Mirror", "beauty", 19.99, 34).with_brand("Glamour Beauty"),
            Item::new(3, "Powder Canister", "beauty", 14.99, 89).with_brand("Velvet Touch"),
            Item::new(4, "Red Lipstick", "beauty", 12.99, 91).with_brand("Chic Cosmetics"),
            Item::new(5, "Red Nail Polish", "beauty", 8.99, 0).with_brand("Nail Couture"),
            Item::new(6, "Calvin Klein CK One", "fragrances", 49.99, 29).with_brand("Calvin Klein"),
            Item::new(7, "Chanel Coco Noir Eau De", "fragrances", 129.99, 58).with_brand("Chanel"),
            Item::new(8, "Dior J'adore", "fragrances", 89.99, 98).with_brand("Dior"),
            Item::new(9, "Annibale Colombo Bed", "furniture", 1899.99, 88).with_brand("Annibale Colombo"),
            Item::new(10, "Annibale Colombo Sofa", "furniture", 2499.99, 60).with_brand("Annibale Colombo"),
            Item::new(11, "Bedside Table African Cherry", "furniture", 299.99, 7).with_brand("Furniture Co."),
            Item::new(12, "Apple", "groceries", 1.99, 8),
            Item::new(13, "Beef Steak", "groceries", 12.99, 86),
        ];
        let phones = [(14, 12), (15, 80), (16, 3), (17, 80), (18, 0), (19, 45), (20, 19), (21, 66)];
        items.extend(phones.into_iter().map(|(id, stock)| {
            Item::new(id, format!("Smartphone {id}"), "smartphones", 199.0 + id as f64, stock).with_brand("Phonix")
        }));
        Self::new(items)
    }

    /// Make every subsequent call wait `latency` before answering.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap_or_else(|p| p.into_inner()) = latency;
    }

    /// Make every subsequent call fail with a network error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls made so far, across all operations.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Paths requested so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    async fn answer(&self, request: String) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap_or_else(|p| p.into_inner()).push(request);

        let latency = *self.latency.lock().unwrap_or_else(|p| p.into_inner());
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Network("HTTP 503 Service Unavailable".into()));
        }
        Ok(())
    }

    fn page(mut items: Vec<&Item>, params: &ListParams) -> ProductsPage {
        if let Some(field) = params.sort_by {
            sort::sort_items(&mut items, field, params.order.unwrap_or(SortOrder::Asc));
        } else if params.order == Some(SortOrder::Desc) {
            sort::sort_items(&mut items, SortField::Title, SortOrder::Desc);
        }

        let total = items.len() as u64;
        let skip = params.skip.unwrap_or(0) as usize;
        let limit = params.limit.map_or(30, |l| l as usize);
        let products: Vec<Item> = items.into_iter().skip(skip).take(limit).cloned().collect();
        ProductsPage { limit: products.len() as u64, products, total, skip: skip as u64 }
    }
}

#[async_trait]
impl CatalogueSource for StaticCatalogue {
    async fn list_products(&self, params: &ListParams) -> Result<ProductsPage, Error> {
        self.answer(QueryKey::List { params: params.clone() }.to_string()).await?;
        Ok(Self::page(self.items.iter().collect(), params))
    }

    async fn get_product(&self, id: u64) -> Result<Item, Error> {
        self.answer(format!("products/{id}")).await?;
        self.items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("product {id}")))
    }

    async fn search_products(&self, term: &str, limit: u32) -> Result<ProductsPage, Error> {
        self.answer(format!("products/search?q={term}&limit={limit}")).await?;
        let needle = term.to_lowercase();
        let hits: Vec<&Item> = self.items.iter().filter(|item| item.matches_text(&needle)).collect();
        Ok(Self::page(hits, &ListParams::limited(limit)))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        self.answer("products/categories".into()).await?;
        let slugs: BTreeSet<&str> = self.items.iter().map(|item| item.category.as_str()).collect();
        Ok(slugs
            .into_iter()
            .map(|slug| Category {
                slug: slug.to_string(),
                name: title_case(slug),
                url: format!("https://dummyjson.com/products/category/{slug}"),
            })
            .collect())
    }

    async fn list_products_by_category(&self, slug: &str, params: &ListParams) -> Result<ProductsPage, Error> {
        let key = QueryKey::ByCategory { slug: slug.to_string(), params: params.clone() };
        self.answer(key.to_string()).await?;
        let matching: Vec<&Item> = self.items.iter().filter(|item| item.category == slug).collect();
        Ok(Self::page(matching, params))
    }
}

fn title_case(slug: &str) -> String {
    slug.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
