//! Cart editing and checkout.
//!
//! Each run is a short-lived process, so edits flush the debounced sync
//! before returning instead of waiting out the quiet period.

use quickcart_client::CartController;
use quickcart_core::{ProductId, format_price};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Add units of a product.
///
/// # Errors
///
/// Returns an error if the quantity is zero or the cart cannot be saved.
#[allow(clippy::print_stdout)]
pub async fn add(controller: &CartController, product_id: ProductId, quantity: u32) -> CommandResult {
    let now = controller.add(product_id, quantity)?;
    println!("Product {product_id}: {now} in cart");
    finish_edit(controller).await;
    Ok(())
}

/// Take one unit away.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
#[allow(clippy::print_stdout)]
pub async fn remove(controller: &CartController, product_id: ProductId) -> CommandResult {
    let left = controller.remove(product_id)?;
    println!("Product {product_id}: {left} in cart");
    finish_edit(controller).await;
    Ok(())
}

/// Set a line's quantity.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
#[allow(clippy::print_stdout)]
pub async fn set(controller: &CartController, product_id: ProductId, quantity: u32) -> CommandResult {
    controller.set_quantity(product_id, quantity)?;
    println!("Product {product_id}: {quantity} in cart");
    finish_edit(controller).await;
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error if the cart cannot be saved.
#[allow(clippy::print_stdout)]
pub async fn drop_line(controller: &CartController, product_id: ProductId) -> CommandResult {
    if controller.remove_line(product_id)? {
        println!("Product {product_id} removed");
        finish_edit(controller).await;
    } else {
        println!("Product {product_id} was not in the cart");
    }
    Ok(())
}

/// Print the cart with prices from the server.
///
/// Falls back to quantities only when the catalog cannot be fetched.
#[allow(clippy::print_stdout)]
pub async fn show(controller: &CartController) -> CommandResult {
    if let Err(e) = controller.load_products().await {
        tracing::warn!(error = %e, "could not load prices");
    }

    let summary = controller.summary();
    if summary.lines.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }

    for line in &summary.lines {
        let name = line.name.as_deref().unwrap_or("(unknown)");
        let total = line
            .line_total
            .map_or_else(|| "-".to_string(), format_price);
        println!(
            "{:>4}  {:<24} x{:<4} {:>10}",
            line.product_id, name, line.quantity, total
        );
    }
    println!(
        "{} item(s), total {}",
        summary.item_count,
        format_price(summary.total)
    );
    Ok(())
}

/// Adopt the server cart when the local one is empty.
///
/// # Errors
///
/// Returns an error if the server cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn pull(controller: &CartController) -> CommandResult {
    if controller.restore_from_server().await? {
        println!("Restored {} line(s) from the server", controller.items().len());
    } else {
        println!("Local cart kept");
    }
    Ok(())
}

/// Place the order.
///
/// # Errors
///
/// Returns the server's message if the order is rejected.
#[allow(clippy::print_stdout)]
pub async fn checkout(controller: &CartController) -> CommandResult {
    match controller.checkout().await {
        Ok(response) => {
            println!(
                "Order #{} placed, total {}",
                response.order_id,
                format_price(response.total_amount)
            );
            Ok(())
        }
        Err(e) => {
            // The cart is untouched; push it back to the server before exiting.
            controller.flush_sync().await;
            Err(e.into())
        }
    }
}

async fn finish_edit(controller: &CartController) {
    controller.flush_sync().await;
    if let Some(error) = controller.last_sync_error() {
        tracing::warn!("Saved locally, server sync failed: {error}");
    }
}
