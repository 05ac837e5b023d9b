//! Billing: invoices every placed order.

use std::sync::Arc;

use courier_core::{HandlerError, NotificationHandler, RegistryBuilder};
use courier_types::MediatorOptions;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::orders::{OrderBook, OrderPlaced};

pub struct InvoiceOnOrderPlaced {
    book: Arc<OrderBook>,
}

impl NotificationHandler<OrderPlaced> for InvoiceOnOrderPlaced {
    async fn handle(
        &self,
        notification: &OrderPlaced,
        _options: &MediatorOptions,
        cancel: CancellationToken,
    ) -> Result<(), HandlerError> {
        anyhow::ensure!(!cancel.is_cancelled(), "billing cancelled before invoicing");
        let found = self
            .book
            .update(&notification.order_id, |status| status.invoiced = true);
        anyhow::ensure!(found, "order {} is not in the order book", notification.order_id);
        info!(
            order_id = %notification.order_id,
            total_cents = notification.total_cents,
            "invoice issued"
        );
        Ok(())
    }
}

pub fn register(builder: RegistryBuilder, book: &Arc<OrderBook>) -> RegistryBuilder {
    builder.notification_handler::<OrderPlaced, _>(InvoiceOnOrderPlaced {
        book: Arc::clone(book),
    })
}
