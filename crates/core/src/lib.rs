//! Core types and shared functionality for storedb.
//!
//! This crate provides:
//! - Catalogue domain types and query keys
//! - In-memory query cache with staleness, deduplication and last-request-wins
//! - Debouncing of typed input
//! - The filter/sort/paginate engine
//! - Browse sessions built on a shared, cached catalogue
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod catalogue;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod model;
pub mod query;
pub mod session;
pub mod source;
pub mod view;

pub use cache::{QueryCache, QueryState, QueryStatus};
pub use catalogue::Catalogue;
pub use config::AppConfig;
pub use engine::{DerivedPage, FilterState, Source};
pub use error::Error;
pub use model::{Category, Item, ProductsPage, StockStatus};
pub use query::{ListParams, QueryKey, SortField, SortOrder};
pub use session::BrowseSession;
pub use source::CatalogueSource;
pub use view::{BrowseOptions, Scope, ViewState, ViewStatus};
