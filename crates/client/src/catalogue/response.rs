//! Catalogue API response types and normalization.

use serde::Deserialize;
use storedb_core::{Category, Item, ProductsPage};

/// Raw product record. Only the fields the browser shows are decoded.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProduct {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub discount_percentage: Option<f64>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub availability_status: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Raw envelope of listing and search endpoints.
#[derive(Debug, Deserialize)]
pub struct ApiProductsResponse {
    pub products: Vec<ApiProduct>,
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

/// Category entry. Older deployments list bare slugs instead of objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiCategory {
    Detailed { slug: String, name: String, url: String },
    Slug(String),
}

impl From<ApiProduct> for Item {
    fn from(raw: ApiProduct) -> Self {
        Item {
            id: raw.id,
            title: raw.title,
            category: raw.category,
            price: raw.price,
            stock: raw.stock,
            brand: raw.brand.filter(|brand| !brand.is_empty()),
            description: raw.description,
            discount_percentage: raw.discount_percentage,
            rating: raw.rating,
            sku: raw.sku,
            availability_status: raw.availability_status,
            thumbnail: raw.thumbnail,
            tags: raw.tags,
        }
    }
}

impl From<ApiProductsResponse> for ProductsPage {
    fn from(raw: ApiProductsResponse) -> Self {
        ProductsPage {
            products: raw.products.into_iter().map(Item::from).collect(),
            total: raw.total,
            skip: raw.skip,
            limit: raw.limit,
        }
    }
}

impl ApiCategory {
    /// Normalize against the catalogue root used to fetch it.
    pub fn into_category(self, base_url: &str) -> Category {
        match self {
            ApiCategory::Detailed { slug, name, url } => Category { slug, name, url },
            ApiCategory::Slug(slug) => {
                let name = slug
                    .split('-')
                    .map(|word| {
                        let mut chars = word.chars();
                        chars.next().map(|c| c.to_uppercase().chain(chars).collect::<String>()).unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                let url = format!("{}/products/category/{slug}", base_url.trim_end_matches('/'));
                Category { slug, name, url }
            }
        }
    }
}
