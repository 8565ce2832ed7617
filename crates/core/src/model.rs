//! Catalogue records as held by the query cache.
//!
//! These are the normalized shapes the client decodes remote JSON into. They are
//! immutable once fetched and shared behind `Arc` by the cache entry that owns them.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Stock level at or below which an item counts as running low.
pub const LOW_STOCK_THRESHOLD: u32 = 10;

/// A single catalogue product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Item {
    pub id: u64,
    pub title: String,
    /// Category slug, e.g. `"smartphones"`.
    pub category: String,
    pub price: f64,
    pub stock: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Item {
    /// Create an item with only the fields the browse engine looks at.
    pub fn new(id: u64, title: impl Into<String>, category: impl Into<String>, price: f64, stock: u32) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            price,
            stock,
            brand: None,
            description: String::new(),
            discount_percentage: None,
            rating: None,
            sku: None,
            availability_status: None,
            thumbnail: None,
            tags: Vec::new(),
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn stock_status(&self) -> StockStatus {
        StockStatus::for_stock(self.stock)
    }

    /// Price after the listed discount, if any.
    pub fn discounted_price(&self) -> f64 {
        match self.discount_percentage {
            Some(pct) if pct > 0.0 => self.price * (1.0 - pct / 100.0),
            _ => self.price,
        }
    }

    /// Case-insensitive substring match on title or brand.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_text(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .brand
                .as_deref()
                .is_some_and(|brand| brand.to_lowercase().contains(needle))
    }
}

/// Coarse stock indicator shown next to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum StockStatus {
    InStock,
    LowStock,
    OutOfStock,
}

impl StockStatus {
    pub fn for_stock(stock: u32) -> Self {
        match stock {
            0 => StockStatus::OutOfStock,
            n if n <= LOW_STOCK_THRESHOLD => StockStatus::LowStock,
            _ => StockStatus::InStock,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StockStatus::InStock => "In Stock",
            StockStatus::LowStock => "Low Stock",
            StockStatus::OutOfStock => "Out of Stock",
        }
    }
}

/// A product category as listed by the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub slug: String,
    pub name: String,
    pub url: String,
}

/// One page of products as returned by listing and search endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProductsPage {
    pub products: Vec<Item>,
    pub total: u64,
    pub skip: u64,
    pub limit: u64,
}
