//! Application state wiring the mediator together.
//!
//! `AppState` owns the options, the frozen handler registry and the mediator
//! built over it. Every CLI command works against the same state.

use std::path::Path;
use std::sync::Arc;

use courier_core::config::load_options;
use courier_core::{HandlerRegistry, Mediator};
use courier_types::MediatorOptions;

use crate::services::{self, orders::OrderBook};

/// Shared application state holding the mediator and the sample services'
/// storage.
#[derive(Clone)]
pub struct AppState {
    pub options: Arc<MediatorOptions>,
    pub registry: Arc<HandlerRegistry>,
    pub mediator: Arc<Mediator>,
    pub book: Arc<OrderBook>,
}

impl AppState {
    /// Load options from `config_path` and register every sample service.
    pub async fn init(config_path: &Path) -> Self {
        let options = load_options(config_path).await;
        Self::with_options(options)
    }

    pub fn with_options(options: MediatorOptions) -> Self {
        let options = Arc::new(options);
        let book = Arc::new(OrderBook::new());
        let builder = HandlerRegistry::builder(Arc::clone(&options));
        let registry = Arc::new(services::register_all(builder, &book).build());
        let mediator = Arc::new(Mediator::from_registry(Arc::clone(&registry)));
        tracing::debug!(
            requests = registry.request_count(),
            notifications = registry.notification_count(),
            "application state initialized"
        );

        Self {
            options,
            registry,
            mediator,
            book,
        }
    }
}
