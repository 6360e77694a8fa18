//! Read-only views of the catalog and order history.

use quickcart_client::CartController;
use quickcart_core::format_price;

/// Print every product.
///
/// # Errors
///
/// Returns an error if the server cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn products(controller: &CartController) -> Result<(), Box<dyn std::error::Error>> {
    let products = controller.load_products().await?;
    if products.is_empty() {
        println!("No products.");
        return Ok(());
    }

    println!("{:>4}  {:<24} {:>10} {:>6}", "ID", "NAME", "PRICE", "STOCK");
    for product in products {
        println!(
            "{:>4}  {:<24} {:>10} {:>6}",
            product.id,
            product.name,
            format_price(product.price),
            product.stock
        );
    }
    Ok(())
}

/// Print this user's orders, newest first.
///
/// # Errors
///
/// Returns an error if the server cannot be reached.
#[allow(clippy::print_stdout)]
pub async fn orders(controller: &CartController) -> Result<(), Box<dyn std::error::Error>> {
    let orders = controller.orders().await?;
    if orders.is_empty() {
        println!("No orders for {}.", controller.user_id());
        return Ok(());
    }

    for order in orders {
        let units: u32 = order.items.iter().map(|item| item.quantity).sum();
        println!(
            "#{}  {}  {} item(s)  {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            units,
            format_price(order.total_amount)
        );
    }
    Ok(())
}
