//! storedb command-line entry point.
//!
//! One-shot listing commands print a single page and exit; `browse` runs an
//! interactive loop. Logs go to stderr so stdout stays clean for output.

use std::sync::Arc;

use anyhow::{Result, bail, ensure};
use clap::{Parser, Subcommand};
use storedb_client::{CatalogueClient, CatalogueConfig};
use storedb_core::{AppConfig, BrowseOptions, Catalogue, FilterState, Scope, SortField, SortOrder, ViewStatus, view};
use tracing_subscriber::EnvFilter;

mod browse;
mod render;

#[derive(Parser, Debug)]
#[command(name = "storedb", version, about = "Browse the product catalogue")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Catalogue base URL (overrides STOREDB_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Items per page (overrides STOREDB_PAGE_SIZE)
    #[arg(long, global = true)]
    page_size: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by the listing commands.
#[derive(clap::Args, Debug, Clone)]
struct ListArgs {
    /// Text to search for in title and brand
    #[arg(short, long)]
    search: Option<String>,

    /// Sort field: title, price or stock
    #[arg(long, default_value = "title")]
    sort: SortField,

    /// Sort order: asc or desc
    #[arg(long, default_value = "asc")]
    order: SortOrder,

    /// 1-based page number
    #[arg(short, long, default_value_t = 1)]
    page: usize,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show one page of the whole inventory
    Inventory {
        #[command(flatten)]
        list: ListArgs,

        /// Keep only these category slugs (repeatable)
        #[arg(short = 'c', long = "category")]
        categories: Vec<String>,
    },
    /// List product categories
    Categories,
    /// Show one page of a single category
    Category {
        /// Category slug, e.g. "smartphones"
        slug: String,

        #[command(flatten)]
        list: ListArgs,
    },
    /// Show one product with similar products
    Product {
        /// Product id
        id: u64,
    },
    /// Browse interactively (reads commands from stdin)
    Browse {
        /// Start inside this category instead of the whole inventory
        #[arg(short = 'c', long = "category")]
        category: Option<String>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load()?;
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(page_size) = cli.page_size {
        config.page_size = page_size;
    }
    config.validate()?;
    Ok(config)
}

fn filter_for(list: &ListArgs, categories: &[String]) -> Result<FilterState> {
    ensure!(list.page >= 1, "page must be at least 1");
    let mut filter = FilterState::default();
    filter.set_search(list.search.as_deref().unwrap_or_default().trim());
    filter.set_categories(categories.iter().cloned());
    filter.set_sort(list.sort, list.order);
    filter.set_page(list.page);
    Ok(filter)
}

async fn show_page(
    catalogue: &Catalogue, options: &BrowseOptions, scope: Scope, filter: FilterState, json: bool,
) -> Result<()> {
    let view = view::load(catalogue, &scope, &filter, options).await;
    if view.status == ViewStatus::Failed {
        bail!("failed to load products: {}", view.error.as_deref().unwrap_or("unknown error"));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        print!("{}", render::view(&view, &filter, options.page_size));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let client = CatalogueClient::new(CatalogueConfig::from(&config))?;
    let catalogue = Arc::new(Catalogue::new(Arc::new(client)));
    let options = BrowseOptions::from(&config);

    match cli.command {
        Commands::Inventory { list, categories } => {
            let filter = filter_for(&list, &categories)?;
            show_page(&catalogue, &options, Scope::Inventory, filter, cli.json).await?;
        }
        Commands::Category { slug, list } => {
            ensure!(!slug.trim().is_empty(), "category slug cannot be empty");
            let filter = filter_for(&list, &[])?;
            show_page(&catalogue, &options, Scope::Category(slug.trim().to_string()), filter, cli.json).await?;
        }
        Commands::Categories => {
            let categories = catalogue.categories().await.into_result()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&*categories)?);
            } else {
                print!("{}", render::categories(&categories));
            }
        }
        Commands::Product { id } => {
            let item = catalogue.product(id).await.into_result()?;
            let similar = catalogue.similar_products(&item.category, item.id).await;
            if let Some(err) = &similar.error {
                tracing::warn!(id, error = %err, "similar products unavailable");
            }
            let similar = similar.value.as_deref().map(Vec::as_slice).unwrap_or_default();
            if cli.json {
                let output = serde_json::json!({ "product": &*item, "similar": similar });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print!("{}", render::product(&item, similar));
            }
        }
        Commands::Browse { category } => {
            let scope = match category {
                Some(slug) if !slug.trim().is_empty() => Scope::Category(slug.trim().to_string()),
                _ => Scope::Inventory,
            };
            browse::run(catalogue, scope, options).await?;
        }
    }

    Ok(())
}
