//! Domain models shared by the server and the client.

pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartItem, CartLine, ItemError, coalesce_items, total_quantity, validate_items};
pub use order::{NewOrder, Order, OrderItem};
pub use product::Product;
