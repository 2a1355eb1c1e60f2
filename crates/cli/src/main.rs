//! Cosmica CLI - Terminal front end for the toy storefront.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered and sorted
//! cosmica list --search robot --category Tech --sort price-asc
//!
//! # Show category filter buttons with counts
//! cosmica categories
//!
//! # Product detail
//! cosmica show 12
//!
//! # Create a product from a YAML or JSON draft
//! cosmica create --file new-product.yaml
//!
//! # Replace a product's fields
//! cosmica update 12 --file product-12.yaml
//!
//! # Build a cart from product ids and print totals
//! cosmica cart 3 3 7
//! ```
//!
//! # Commands
//!
//! - `list` - Filtered, sorted product listing
//! - `categories` - Categories with product counts
//! - `show` - Product detail
//! - `create` - Create a product
//! - `update` - Update a product
//! - `delete` - Delete a product
//! - `cart` - Cart preview with line and order totals

#![cfg_attr(not(test), forbid(unsafe_code))]
// Command output is the point of this binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cosmica_core::ProductId;
use cosmica_storefront::error::AppError;
use cosmica_storefront::listing::ListingQuery;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "cosmica")]
#[command(author, version, about = "Cosmica storefront tools")]
struct Cli {
    /// Retry the catalog fetch this many times if it fails
    #[arg(long, global = true, default_value_t = 0)]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    List {
        /// Free-text search over name, descriptions, category and brand
        #[arg(short, long)]
        search: Option<String>,

        /// Exact category (case-insensitive)
        #[arg(short, long)]
        category: Option<String>,

        /// Sort order (`name-asc`, `name-desc`, `price-asc`, `price-desc`, `category`)
        #[arg(long)]
        sort: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List categories with product counts
    Categories,
    /// Show a single product
    Show {
        /// Product id
        id: String,
    },
    /// Create a product from a YAML or JSON draft file
    Create {
        /// Path to the draft file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Replace a product's fields from a YAML or JSON draft file
    Update {
        /// Product id
        id: String,

        /// Path to the draft file
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete a product
    Delete {
        /// Product id
        id: String,
    },
    /// Build a cart from product ids and print it
    Cart {
        /// Product ids; repeat an id to add more units
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cosmica_storefront=info,cosmica_cli=info".into());

    // JSON lines for log shippers, text for humans
    let json = std::env::var("COSMICA_LOG_FORMAT").is_ok_and(|format| format == "json");
    let json_layer = json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        let message = e
            .downcast_ref::<AppError>()
            .map_or_else(|| e.to_string(), AppError::user_message);
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let retries = cli.retries;
    match cli.command {
        Commands::List {
            search,
            category,
            sort,
            json,
        } => {
            let query = ListingQuery::new(search.as_deref(), category.as_deref(), sort.as_deref());
            commands::products::list(retries, &query, json).await?;
        }
        Commands::Categories => commands::products::categories(retries).await?,
        Commands::Show { id } => commands::products::show(retries, &ProductId::new(id)).await?,
        Commands::Create { file } => commands::products::create(&file).await?,
        Commands::Update { id, file } => {
            commands::products::update(&ProductId::new(id), &file).await?;
        }
        Commands::Delete { id } => commands::products::delete(&ProductId::new(id)).await?,
        Commands::Cart { ids } => {
            let ids: Vec<ProductId> = ids.into_iter().map(ProductId::new).collect();
            commands::cart::preview(retries, &ids).await?;
        }
    }
    Ok(())
}
