//! storedb MCP server entry point.
//!
//! Boots the catalogue browser on stdio transport. Logging goes to stderr to
//! avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use storedb_client::{CatalogueClient, CatalogueConfig};
use storedb_core::{AppConfig, BrowseOptions, Catalogue};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(base_url = %config.base_url, "Starting storedb server on stdio transport");

    let client = CatalogueClient::new(CatalogueConfig::from(&config))?;
    let catalogue = Arc::new(Catalogue::new(Arc::new(client)));
    let handler = handler::StoreDbServer::new(catalogue, BrowseOptions::from(&config));

    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
