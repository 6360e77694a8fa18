//! QuickCart CLI - drive a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! qc products
//!
//! # Edit the cart (saved locally, synced to the server)
//! qc add 1 --quantity 2
//! qc remove 1
//! qc set 3 5
//!
//! # Review and place the order
//! qc show
//! qc checkout
//! qc orders
//! ```
//!
//! # Commands
//!
//! - `products` - List products with price and stock
//! - `add` / `remove` / `set` / `drop` - Edit the local cart
//! - `show` - Cart lines and total
//! - `pull` - Adopt the server cart when the local one is empty
//! - `checkout` - Place an order for the cart
//! - `orders` - Past orders

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use quickcart_client::{CartController, DEFAULT_API_URL, HttpCartApi, JsonFileStorage};
use quickcart_core::{ProductId, UserId};

mod commands;

#[derive(Parser)]
#[command(name = "qc")]
#[command(author, version, about = "QuickCart terminal client")]
struct Cli {
    /// Server base URL
    #[arg(long, env = "QUICKCART_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Whose cart to use
    #[arg(long, env = "QUICKCART_USER", default_value = "guest")]
    user: String,

    /// Where the cart is saved between runs
    #[arg(long, env = "QUICKCART_CART_FILE", default_value = ".quickcart/cart.json")]
    cart_file: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List products
    Products,
    /// Add units of a product to the cart
    Add {
        product_id: ProductId,

        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Take one unit of a product out of the cart
    Remove { product_id: ProductId },
    /// Set the quantity of a product (0 removes it)
    Set { product_id: ProductId, quantity: u32 },
    /// Remove a product from the cart entirely
    Drop { product_id: ProductId },
    /// Show the cart
    Show,
    /// Adopt the server cart if the local one is empty
    Pull,
    /// Place an order for the cart
    Checkout,
    /// List past orders
    Orders,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "quickcart_client=info,quickcart_cli=info".into());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let user_id = UserId::parse(&cli.user)?;
    let api = Arc::new(HttpCartApi::new(&cli.api_url)?);
    let storage = Box::new(JsonFileStorage::new(cli.cart_file));
    tracing::debug!(
        api = %api.base_url(),
        cart_file = %storage.path().display(),
        user = %user_id,
        "client ready"
    );
    let controller = CartController::new(user_id, api, storage)?;

    match cli.command {
        Commands::Products => commands::catalog::products(&controller).await?,
        Commands::Orders => commands::catalog::orders(&controller).await?,
        Commands::Add {
            product_id,
            quantity,
        } => commands::cart::add(&controller, product_id, quantity).await?,
        Commands::Remove { product_id } => commands::cart::remove(&controller, product_id).await?,
        Commands::Set {
            product_id,
            quantity,
        } => commands::cart::set(&controller, product_id, quantity).await?,
        Commands::Drop { product_id } => commands::cart::drop_line(&controller, product_id).await?,
        Commands::Show => commands::cart::show(&controller).await?,
        Commands::Pull => commands::cart::pull(&controller).await?,
        Commands::Checkout => commands::cart::checkout(&controller).await?,
    }
    Ok(())
}
