//! Handler traits implemented by application code.
//!
//! Both traits use RPITIT (`impl Future` in trait position), so implementors
//! can simply write `async fn handle(...)`. They are not object-safe; the
//! registry stores them behind the erased wrappers in [`crate::erased`].

use std::future::Future;

use courier_types::{MediatorOptions, Notification, Request};
use tokio_util::sync::CancellationToken;

/// Error type returned by handlers.
///
/// Handlers are application code, so they get `anyhow` rather than a closed
/// error enum.
pub type HandlerError = anyhow::Error;

/// Handles exactly one request type.
///
/// A fresh handler is produced by its registered factory for every
/// resolution scope, so implementations may hold per-call state.
pub trait RequestHandler<R: Request>: Send + Sync {
    /// Process the request and produce its response.
    fn handle(
        &self,
        request: R,
        options: &MediatorOptions,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<R::Response, HandlerError>> + Send;
}

/// Reacts to one notification type.
///
/// A single instance is shared across every publish, possibly from several
/// tasks at once.
pub trait NotificationHandler<N: Notification>: Send + Sync {
    /// React to the notification. Errors are logged by the mediator and never
    /// reach the publisher.
    fn handle(
        &self,
        notification: &N,
        options: &MediatorOptions,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}
