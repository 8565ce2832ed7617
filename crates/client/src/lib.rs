//! Client code for storedb.
//!
//! This crate provides the HTTP binding to the remote product catalogue,
//! shared by the server and CLI.

pub mod catalogue;

pub use catalogue::{CatalogueClient, CatalogueConfig, CatalogueError, SearchQuery};
