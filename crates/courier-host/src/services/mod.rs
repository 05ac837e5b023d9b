//! Sample services wired into the mediator by the host.
//!
//! - `orders` -- `PlaceOrder` and `GetOrderStatus` requests, the `OrderPlaced`
//!   notification, and the shared `OrderBook`
//! - `billing` -- invoices placed orders
//! - `shipping` -- ships placed orders (rejects bulk orders)
//!
//! Each module exposes `register(builder, book)`.

pub mod billing;
pub mod orders;
pub mod shipping;

use std::sync::Arc;

use courier_core::RegistryBuilder;

use orders::OrderBook;

/// Register every sample service.
pub fn register_all(builder: RegistryBuilder, book: &Arc<OrderBook>) -> RegistryBuilder {
    let builder = orders::register(builder, book);
    let builder = billing::register(builder, book);
    shipping::register(builder, book)
}
