//! Shipping: dispatches placed orders to a carrier.

use std::sync::Arc;

use courier_core::{HandlerError, NotificationHandler, RegistryBuilder};
use courier_types::MediatorOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::orders::{OrderBook, OrderPlaced};

/// Largest quantity a single parcel can carry.
pub const MAX_PARCEL_QUANTITY: u32 = 100;

pub struct ShipOnOrderPlaced {
    book: Arc<OrderBook>,
}

impl NotificationHandler<OrderPlaced> for ShipOnOrderPlaced {
    async fn handle(
        &self,
        notification: &OrderPlaced,
        _options: &MediatorOptions,
        cancel: CancellationToken,
    ) -> Result<(), HandlerError> {
        if notification.quantity > MAX_PARCEL_QUANTITY {
            anyhow::bail!(
                "no carrier for order {} ({} units exceeds {MAX_PARCEL_QUANTITY})",
                notification.order_id,
                notification.quantity
            );
        }
        anyhow::ensure!(!cancel.is_cancelled(), "shipping cancelled");
        let found = self
            .book
            .update(&notification.order_id, |status| status.shipped = true);
        anyhow::ensure!(found, "order {} is not in the order book", notification.order_id);
        info!(
            order_id = %notification.order_id,
            customer = %notification.customer,
            "parcel dispatched"
        );
        Ok(())
    }
}

pub fn register(builder: RegistryBuilder, book: &Arc<OrderBook>) -> RegistryBuilder {
    builder.notification_handler::<OrderPlaced, _>(ShipOnOrderPlaced {
        book: Arc::clone(book),
    })
}
