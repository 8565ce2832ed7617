//! Remote catalogue client.
//!
//! Binds the logical catalogue operations to the DummyJSON product API and
//! normalizes its responses into the core domain types.
//!
//! ### Endpoints
//!
//! - `GET /products?limit&skip&sortBy&order`: bulk listing, sorted server-side
//! - `GET /products/{id}`: single product
//! - `GET /products/search?q&limit`: free-text search (matched, not sorted)
//! - `GET /products/categories`: category list
//! - `GET /products/category/{slug}?limit&skip&sortBy&order`: by-category listing
//!
//! Only parameters that are set are sent. The request timeout comes from the
//! configuration; no retries happen here (retry is a query-layer decision).

pub mod error;
pub mod request;
pub mod response;

pub use error::CatalogueError;
pub use request::SearchQuery;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{StatusCode, header};
use serde::Serialize;
use serde::de::DeserializeOwned;
use storedb_core::{AppConfig, CatalogueSource, Category, Error, Item, ListParams, ProductsPage};
use url::Url;

/// Default base URL for the catalogue API.
const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "storedb/0.1";

/// Catalogue client configuration.
#[derive(Debug, Clone)]
pub struct CatalogueConfig {
    /// Base URL (default: https://dummyjson.com).
    pub base_url: String,
    /// Request timeout (default: 10s).
    pub timeout: Duration,
    /// User-agent string (default: storedb/0.x).
    pub user_agent: String,
}

impl Default for CatalogueConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for CatalogueConfig {
    fn from(config: &AppConfig) -> Self {
        Self { base_url: config.base_url.clone(), timeout: config.timeout(), user_agent: config.user_agent.clone() }
    }
}

/// HTTP client for the remote catalogue.
#[derive(Debug, Clone)]
pub struct CatalogueClient {
    http: reqwest::Client,
    base: Url,
    config: CatalogueConfig,
}

impl CatalogueClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CatalogueConfig) -> Result<Self, CatalogueError> {
        let base = Url::parse(&config.base_url).map_err(|e| CatalogueError::InvalidBaseUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(CatalogueError::InvalidBaseUrl(config.base_url.clone()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { http, base, config })
    }

    pub fn config(&self) -> &CatalogueConfig {
        &self.config
    }

    /// `GET /products`
    pub async fn fetch_products(&self, params: &ListParams) -> Result<ProductsPage, CatalogueError> {
        let request = self.request(&["products"], Some(params))?;
        let raw: response::ApiProductsResponse = self.execute(request).await?;
        Ok(raw.into())
    }

    /// `GET /products/{id}`
    pub async fn fetch_product(&self, id: u64) -> Result<Item, CatalogueError> {
        request::validate_id(id)?;
        let id = id.to_string();
        let request = self.request::<()>(&["products", id.as_str()], None)?;
        let raw: response::ApiProduct = self.execute(request).await?;
        Ok(raw.into())
    }

    /// `GET /products/search`
    pub async fn fetch_search(&self, query: &SearchQuery) -> Result<ProductsPage, CatalogueError> {
        query.validate()?;
        let request = self.request(&["products", "search"], Some(query))?;
        let raw: response::ApiProductsResponse = self.execute(request).await?;
        Ok(raw.into())
    }

    /// `GET /products/categories`
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, CatalogueError> {
        let request = self.request::<()>(&["products", "categories"], None)?;
        let raw: Vec<response::ApiCategory> = self.execute(request).await?;
        Ok(raw.into_iter().map(|c| c.into_category(&self.config.base_url)).collect())
    }

    /// `GET /products/category/{slug}`
    pub async fn fetch_by_category(&self, slug: &str, params: &ListParams) -> Result<ProductsPage, CatalogueError> {
        request::validate_slug(slug)?;
        let request = self.request(&["products", "category", slug], Some(params))?;
        let raw: response::ApiProductsResponse = self.execute(request).await?;
        Ok(raw.into())
    }

    /// Build a GET request for `segments` below the base URL.
    fn request<Q: Serialize + ?Sized>(
        &self, segments: &[&str], query: Option<&Q>,
    ) -> Result<reqwest::Request, CatalogueError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| CatalogueError::InvalidBaseUrl(self.config.base_url.clone()))?
            .pop_if_empty()
            .extend(segments);

        let mut builder = self.http.get(url).header(header::ACCEPT, "application/json");
        if let Some(query) = query {
            builder = builder.query(query);
        }
        Ok(builder.build()?)
    }

    async fn execute<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T, CatalogueError> {
        let start = Instant::now();
        let url = request.url().clone();
        tracing::debug!(%url, "requesting catalogue");

        let http_response = self.http.execute(request).await?;

        let status = http_response.status();
        tracing::debug!(%url, %status, "catalogue response status");

        if status == StatusCode::NOT_FOUND {
            return Err(CatalogueError::NotFound(url.path().to_string()));
        }

        if status.is_client_error() || status.is_server_error() {
            return Err(CatalogueError::HttpError { status: status.as_u16() });
        }

        let bytes = http_response.bytes().await?;
        let parsed = serde_json::from_slice(&bytes).map_err(|e| CatalogueError::Parse(e.to_string()))?;

        tracing::debug!(%url, elapsed = ?start.elapsed(), bytes = bytes.len(), "catalogue request completed");
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogueSource for CatalogueClient {
    async fn list_products(&self, params: &ListParams) -> Result<ProductsPage, Error> {
        Ok(self.fetch_products(params).await?)
    }

    async fn get_product(&self, id: u64) -> Result<Item, Error> {
        Ok(self.fetch_product(id).await?)
    }

    async fn search_products(&self, term: &str, limit: u32) -> Result<ProductsPage, Error> {
        Ok(self.fetch_search(&SearchQuery::new(term, limit)).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, Error> {
        Ok(self.fetch_categories().await?)
    }

    async fn list_products_by_category(&self, slug: &str, params: &ListParams) -> Result<ProductsPage, Error> {
        Ok(self.fetch_by_category(slug, params).await?)
    }
}
