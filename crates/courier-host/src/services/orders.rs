//! Order intake: placing orders and querying their progress.

use std::sync::Arc;

use courier_core::{HandlerError, RegistryBuilder, RequestHandler};
use courier_types::{MediatorOptions, Notification, Request};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

/// Flat unit price for every SKU, in cents.
const UNIT_PRICE_CENTS: u64 = 1_250;

/// Place a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub customer: String,
    pub sku: String,
    pub quantity: u32,
}

impl Request for PlaceOrder {
    type Response = OrderConfirmation;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub total_cents: u64,
}

/// Look up the progress of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetOrderStatus {
    pub order_id: Uuid,
}

impl Request for GetOrderStatus {
    type Response = Option<OrderStatus>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    pub order_id: Uuid,
    pub customer: String,
    pub invoiced: bool,
    pub shipped: bool,
}

/// Broadcast once an order has been accepted.
#[derive(Debug, Clone)]
pub struct OrderPlaced {
    pub order_id: Uuid,
    pub customer: String,
    pub quantity: u32,
    pub total_cents: u64,
}

impl Notification for OrderPlaced {}

/// In-memory order storage shared by every service.
#[derive(Debug, Default)]
pub struct OrderBook {
    orders: DashMap<Uuid, OrderStatus>,
}

impl OrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, order_id: Uuid, customer: String) {
        self.orders.insert(
            order_id,
            OrderStatus {
                order_id,
                customer,
                invoiced: false,
                shipped: false,
            },
        );
    }

    pub fn get(&self, order_id: &Uuid) -> Option<OrderStatus> {
        self.orders.get(order_id).map(|entry| entry.value().clone())
    }

    /// Apply `update` to an existing order. Returns `false` if unknown.
    pub fn update(&self, order_id: &Uuid, update: impl FnOnce(&mut OrderStatus)) -> bool {
        match self.orders.get_mut(order_id) {
            Some(mut entry) => {
                update(entry.value_mut());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

pub struct PlaceOrderHandler {
    book: Arc<OrderBook>,
}

impl RequestHandler<PlaceOrder> for PlaceOrderHandler {
    async fn handle(
        &self,
        request: PlaceOrder,
        _options: &MediatorOptions,
        _cancel: CancellationToken,
    ) -> Result<OrderConfirmation, HandlerError> {
        anyhow::ensure!(request.quantity > 0, "quantity must be positive");
        anyhow::ensure!(!request.customer.is_empty(), "customer is required");

        let order_id = Uuid::now_v7();
        let total_cents = UNIT_PRICE_CENTS * u64::from(request.quantity);
        self.book.insert(order_id, request.customer.clone());
        info!(
            %order_id,
            customer = %request.customer,
            sku = %request.sku,
            total_cents,
            "order placed"
        );

        Ok(OrderConfirmation {
            order_id,
            total_cents,
        })
    }
}

pub struct GetOrderStatusHandler {
    book: Arc<OrderBook>,
}

impl RequestHandler<GetOrderStatus> for GetOrderStatusHandler {
    async fn handle(
        &self,
        request: GetOrderStatus,
        _options: &MediatorOptions,
        _cancel: CancellationToken,
    ) -> Result<Option<OrderStatus>, HandlerError> {
        Ok(self.book.get(&request.order_id))
    }
}

pub fn register(builder: RegistryBuilder, book: &Arc<OrderBook>) -> RegistryBuilder {
    let place_book = Arc::clone(book);
    let status_book = Arc::clone(book);
    builder
        .json_request_handler::<PlaceOrder, _, _>(move || PlaceOrderHandler {
            book: Arc::clone(&place_book),
        })
        .json_request_handler::<GetOrderStatus, _, _>(move || GetOrderStatusHandler {
            book: Arc::clone(&status_book),
        })
}
