//! Object-safe wrappers for the handler traits.
//!
//! Follows the usual blanket-adapter pattern:
//! 1. Define object-safe `Erased*` traits with boxed futures and `dyn Any`
//!    messages
//! 2. Implement them for adapter structs that own a typed handler
//! 3. Downcast back to the concrete message type inside the adapter

use std::any::{Any, type_name};
use std::marker::PhantomData;

use anyhow::anyhow;
use courier_types::{MediatorOptions, Notification, Request};
use futures_util::future::BoxFuture;
use tokio_util::sync::CancellationToken;

use crate::handler::{HandlerError, NotificationHandler, RequestHandler};
use crate::identity::MessageIdentity;

/// A request or response travelling through the erased path.
pub type AnyMessage = Box<dyn Any + Send>;

/// Object-safe version of [`RequestHandler`].
pub trait ErasedRequestHandler: Send + Sync {
    /// Type name of the wrapped handler, for logs.
    fn handler_name(&self) -> &'static str;

    fn handle_erased<'a>(
        &'a self,
        request: AnyMessage,
        options: &'a MediatorOptions,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyMessage, HandlerError>>;
}

/// Object-safe version of [`NotificationHandler`], carrying the identity the
/// handler was declared for.
pub trait ErasedNotificationHandler: Send + Sync {
    fn identity(&self) -> &MessageIdentity;

    fn handler_name(&self) -> &'static str;

    fn handle_erased<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        options: &'a MediatorOptions,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), HandlerError>>;
}

/// Adapts a typed `RequestHandler<R>`.
pub struct RequestAdapter<R, H> {
    handler: H,
    _request: PhantomData<fn(R)>,
}

impl<R, H> RequestAdapter<R, H> {
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _request: PhantomData,
        }
    }
}

impl<R, H> ErasedRequestHandler for RequestAdapter<R, H>
where
    R: Request,
    H: RequestHandler<R>,
{
    fn handler_name(&self) -> &'static str {
        type_name::<H>()
    }

    fn handle_erased<'a>(
        &'a self,
        request: AnyMessage,
        options: &'a MediatorOptions,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<AnyMessage, HandlerError>> {
        Box::pin(async move {
            let request = request
                .downcast::<R>()
                .map_err(|_| anyhow!("{} expects {}", type_name::<H>(), type_name::<R>()))?;
            let response = self.handler.handle(*request, options, cancel).await?;
            Ok(Box::new(response) as AnyMessage)
        })
    }
}

/// Adapts a typed `NotificationHandler<N>` declared for `identity`.
pub struct NotificationAdapter<N, H> {
    identity: MessageIdentity,
    handler: H,
    _notification: PhantomData<fn(&N)>,
}

impl<N, H> NotificationAdapter<N, H> {
    pub fn new(identity: MessageIdentity, handler: H) -> Self {
        Self {
            identity,
            handler,
            _notification: PhantomData,
        }
    }
}

impl<N, H> ErasedNotificationHandler for NotificationAdapter<N, H>
where
    N: Notification,
    H: NotificationHandler<N>,
{
    fn identity(&self) -> &MessageIdentity {
        &self.identity
    }

    fn handler_name(&self) -> &'static str {
        type_name::<H>()
    }

    fn handle_erased<'a>(
        &'a self,
        notification: &'a (dyn Any + Send + Sync),
        options: &'a MediatorOptions,
        cancel: CancellationToken,
    ) -> BoxFuture<'a, Result<(), HandlerError>> {
        Box::pin(async move {
            // Two types can share an identity in short-name mode.
            let notification = notification.downcast_ref::<N>().ok_or_else(|| {
                anyhow!(
                    "{} declared for '{}' cannot handle this notification type",
                    type_name::<H>(),
                    self.identity
                )
            })?;
            self.handler.handle(notification, options, cancel).await
        })
    }
}
