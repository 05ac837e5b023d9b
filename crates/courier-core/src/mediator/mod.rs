//! The mediator: request and notification dispatch.
//!
//! - `request` -- `send`, `send_with_response`, `send_as`, `send_json`
//! - `notification` -- `publish` and the `PublishHandle` it returns
//! - `error` -- `MediatorError`

pub mod error;
pub mod notification;
pub mod request;

use std::sync::Arc;

use courier_types::MediatorOptions;

use crate::erased::ErasedNotificationHandler;
use crate::registry::{HandlerProvider, HandlerRegistry, TypeScanner};

pub use error::MediatorError;
pub use notification::{PublishHandle, PublishReport};

/// In-process dispatcher for requests and notifications.
///
/// Notification handlers are captured once, when the mediator is built.
/// Request handlers are resolved per call through a fresh scope.
#[derive(Clone)]
pub struct Mediator {
    options: Arc<MediatorOptions>,
    provider: Arc<dyn HandlerProvider>,
    scanner: Arc<dyn TypeScanner>,
    notification_handlers: Vec<Arc<dyn ErasedNotificationHandler>>,
}

impl Mediator {
    /// Build a mediator over arbitrary provider and scanner ports.
    ///
    /// `options` must be the same options the provider derived notification
    /// identities with, or lookups silently miss.
    pub fn new(
        provider: Arc<dyn HandlerProvider>,
        scanner: Arc<dyn TypeScanner>,
        options: Arc<MediatorOptions>,
    ) -> Self {
        let notification_handlers = provider.notification_handlers();
        tracing::debug!(
            notification_handlers = notification_handlers.len(),
            ignore_namespace = options.ignore_namespace,
            "mediator ready"
        );
        Self {
            options,
            provider,
            scanner,
            notification_handlers,
        }
    }

    /// Build a mediator over a [`HandlerRegistry`], reusing its options.
    pub fn from_registry(registry: Arc<HandlerRegistry>) -> Self {
        let options = Arc::clone(registry.options());
        Self::new(registry.clone(), registry, options)
    }

    pub fn options(&self) -> &MediatorOptions {
        &self.options
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("options", &self.options)
            .field("notification_handlers", &self.notification_handlers.len())
            .finish()
    }
}
