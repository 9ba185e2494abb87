//! B&W CLI - verification, catalog and product tools.
//!
//! # Usage
//!
//! ```bash
//! # Check an order code
//! bw-cli verify bw001234
//!
//! # Browse the catalog
//! bw-cli catalog list --color black --price under-90
//! bw-cli catalog show 0b1ac4ee-0000-4000-8000-000000000001
//!
//! # Work with the persisted cart
//! bw-cli cart add 0b1ac4ee-0000-4000-8000-000000000001 --size L --quantity 2
//! bw-cli cart show
//! bw-cli cart set <line-id> 3
//! bw-cli cart remove <line-id>
//! bw-cli cart clear
//!
//! # Create a product through the hosted backend
//! bw-cli admin create-product --name "Essential Black Tee" --price 85 \
//!     --category tee --sku BWB002 --color black --size M --size L \
//!     --stock 12 --image front.jpg
//! ```
//!
//! Storefront commands read the same environment as the storefront server;
//! `admin` reads `BACKEND_URL` and `BACKEND_SERVICE_KEY`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bw-cli")]
#[command(author, version, about = "B&W store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify an order code
    Verify {
        /// Code printed on the receipt (case-insensitive)
        sku: String,
    },
    /// Browse the catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Work with the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Catalog administration
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List products, newest first
    List {
        /// Match name or tag
        #[arg(short, long)]
        search: Option<String>,
        /// `black`, `white` or `all`
        #[arg(short, long)]
        color: Option<String>,
        /// `under-90`, `90-100`, `over-100` or `all`
        #[arg(short, long)]
        price: Option<String>,
        /// `tops`, `bottoms` or `all`
        #[arg(long)]
        category: Option<String>,
    },
    /// Show one product
    Show {
        /// Product ID
        id: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show lines and total
    Show,
    /// Add a product in a size
    Add {
        /// Product ID
        product_id: String,
        #[arg(short, long)]
        size: String,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Set a line's quantity (zero or less removes it)
    Set {
        /// Line ID
        line_id: String,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Remove a line
    Remove {
        /// Line ID
        line_id: String,
    },
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a product and upload its images
    CreateProduct {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        price: String,
        #[arg(long)]
        category: String,
        #[arg(long)]
        sku: String,
        #[arg(long)]
        color: String,
        /// Repeat for each size
        #[arg(long = "size")]
        sizes: Vec<String>,
        /// Repeat for each tag
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, default_value = "0")]
        stock: String,
        /// Repeat for each image; the first stored one is primary
        #[arg(long = "image")]
        images: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Verify { sku } => commands::verify::verify(&sku).await?,
        Commands::Catalog { action } => match action {
            CatalogAction::List {
                search,
                color,
                price,
                category,
            } => {
                commands::catalog::list(
                    search.as_deref(),
                    color.as_deref(),
                    price.as_deref(),
                    category.as_deref(),
                )
                .await?;
            }
            CatalogAction::Show { id } => commands::catalog::show(&id).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show()?,
            CartAction::Add {
                product_id,
                size,
                quantity,
            } => commands::cart::add(&product_id, &size, quantity).await?,
            CartAction::Set { line_id, quantity } => commands::cart::set(&line_id, quantity)?,
            CartAction::Remove { line_id } => commands::cart::remove(&line_id)?,
            CartAction::Clear => commands::cart::clear()?,
        },
        Commands::Admin { action } => match action {
            AdminAction::CreateProduct {
                name,
                description,
                price,
                category,
                sku,
                color,
                sizes,
                tags,
                stock,
                images,
            } => {
                let form = bw_admin::products::ProductForm {
                    name,
                    description,
                    price,
                    category,
                    sku,
                    color,
                    sizes,
                    tags,
                    stock_quantity: stock,
                };
                commands::admin::create_product(&form, &images).await?;
            }
        },
    }
    Ok(())
}
