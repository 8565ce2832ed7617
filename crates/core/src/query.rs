//! Logical query keys and their staleness policy.
//!
//! A [`QueryKey`] identifies a remote request by value: two keys are the same
//! query iff every field matches. The query cache uses key equality for lookup
//! and for deduplicating concurrent requests.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::Error;

/// Staleness window for bulk and by-category listings (5 minutes).
pub const LISTING_STALE_AFTER: Duration = Duration::from_millis(300_000);

/// Staleness window for a single product (5 minutes).
pub const PRODUCT_STALE_AFTER: Duration = Duration::from_millis(300_000);

/// Staleness window for free-text search results (2 minutes).
pub const SEARCH_STALE_AFTER: Duration = Duration::from_millis(120_000);

/// Staleness window for the category list (10 minutes).
pub const CATEGORIES_STALE_AFTER: Duration = Duration::from_millis(600_000);

/// Field a listing can be ordered by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Title,
    Price,
    Stock,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::Stock => "stock",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(SortField::Title),
            "price" => Ok(SortField::Price),
            "stock" => Ok(SortField::Stock),
            other => Err(Error::InvalidInput(format!("unknown sort field: {other}"))),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!("unknown sort order: {other}"))),
        }
    }
}

/// Optional listing parameters.
///
/// Serializes with the remote parameter names; absent fields are omitted from
/// the outbound query string rather than sent as defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u32>,

    #[serde(rename = "sortBy", skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<SortOrder>,
}

impl ListParams {
    pub fn limited(limit: u32) -> Self {
        Self { limit: Some(limit), ..Default::default() }
    }

    pub fn sorted(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.order = Some(order);
        self
    }

    /// Render as `key=value` pairs in wire order, skipping absent fields.
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(skip) = self.skip {
            pairs.push(("skip", skip.to_string()));
        }
        if let Some(field) = self.sort_by {
            pairs.push(("sortBy", field.as_str().to_string()));
        }
        if let Some(order) = self.order {
            pairs.push(("order", order.as_str().to_string()));
        }
        pairs
    }
}

/// Value-equal identifier for a logical remote request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryKey {
    List { params: ListParams },
    ById { id: u64 },
    Search { term: String, limit: u32 },
    Categories,
    ByCategory { slug: String, params: ListParams },
}

impl QueryKey {
    /// Build a search key; the term is trimmed so padding does not split the cache.
    pub fn search(term: &str, limit: u32) -> Self {
        QueryKey::Search { term: term.trim().to_string(), limit }
    }

    /// How long a settled result for this key counts as fresh.
    pub fn stale_after(&self) -> Duration {
        match self {
            QueryKey::List { .. } | QueryKey::ByCategory { .. } => LISTING_STALE_AFTER,
            QueryKey::ById { .. } => PRODUCT_STALE_AFTER,
            QueryKey::Search { .. } => SEARCH_STALE_AFTER,
            QueryKey::Categories => CATEGORIES_STALE_AFTER,
        }
    }

    /// Stable SHA-256 hex digest of the key's canonical JSON form.
    pub fn fingerprint(&self) -> String {
        let canonical = serde_json::to_string(self).unwrap_or_else(|_| self.to_string());
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn write_pairs(f: &mut fmt::Formatter<'_>, pairs: &[(&str, String)]) -> fmt::Result {
            for (idx, (name, value)) in pairs.iter().enumerate() {
                let sep = if idx == 0 { '?' } else { '&' };
                write!(f, "{sep}{name}={value}")?;
            }
            Ok(())
        }

        match self {
            QueryKey::List { params } => {
                write!(f, "products")?;
                write_pairs(f, &params.pairs())
            }
            QueryKey::ById { id } => write!(f, "products/{id}"),
            QueryKey::Search { term, limit } => write!(f, "products/search?q={term}&limit={limit}"),
            QueryKey::Categories => write!(f, "products/categories"),
            QueryKey::ByCategory { slug, params } => {
                write!(f, "products/category/{slug}")?;
                write_pairs(f, &params.pairs())
            }
        }
    }
}
