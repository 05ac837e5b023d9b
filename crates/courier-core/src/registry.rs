//! Handler registry and the ports the mediator consumes.
//!
//! The mediator never discovers handlers itself. It depends on two traits:
//! - [`TypeScanner`] -- enumerates registered request types per call
//! - [`HandlerProvider`] -- hands out notification handlers once, and a
//!   [`ResolutionScope`] per request call for fresh handler instances
//!
//! [`HandlerRegistry`] implements both from a table populated once at
//! startup through [`RegistryBuilder`]. Registration order is preserved and
//! is the order candidates are tried in.

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;

use courier_types::{MediatorOptions, Notification, Request, TypeDescriptor};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::erased::{
    AnyMessage, ErasedNotificationHandler, ErasedRequestHandler, NotificationAdapter,
    RequestAdapter,
};
use crate::handler::{NotificationHandler, RequestHandler};
use crate::identity::MessageIdentity;

/// Enumerates request types that may serve a dispatch call.
pub trait TypeScanner: Send + Sync {
    /// Registered request types living in `modules`, in registry order.
    fn candidate_types(&self, modules: &[String]) -> Vec<RequestDescriptor>;
}

/// Supplies handler instances to the mediator.
pub trait HandlerProvider: Send + Sync {
    /// Every notification handler. Queried once, at mediator construction.
    fn notification_handlers(&self) -> Vec<Arc<dyn ErasedNotificationHandler>>;

    /// Open a short-lived scope for resolving request handlers. The scope is
    /// released when dropped.
    fn create_scope(&self) -> Box<dyn ResolutionScope + '_>;
}

/// Per-call context that instantiates request handlers.
pub trait ResolutionScope: Send {
    fn resolve_request_handler(
        &mut self,
        request: &RequestDescriptor,
    ) -> Option<Arc<dyn ErasedRequestHandler>>;
}

/// Converts a request type to and from JSON for identity-only dispatch.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    decode: fn(serde_json::Value) -> Result<AnyMessage, serde_json::Error>,
    encode: fn(AnyMessage) -> Result<serde_json::Value, serde_json::Error>,
}

impl JsonCodec {
    fn of<R>() -> Self
    where
        R: Request + DeserializeOwned,
        R::Response: Serialize,
    {
        Self {
            decode: decode_request::<R>,
            encode: encode_response::<R>,
        }
    }

    pub fn decode(&self, payload: serde_json::Value) -> Result<AnyMessage, serde_json::Error> {
        (self.decode)(payload)
    }

    pub fn encode(&self, response: AnyMessage) -> Result<serde_json::Value, serde_json::Error> {
        (self.encode)(response)
    }
}

fn decode_request<R>(payload: serde_json::Value) -> Result<AnyMessage, serde_json::Error>
where
    R: Request + DeserializeOwned,
{
    let request: R = serde_json::from_value(payload)?;
    Ok(Box::new(request))
}

fn encode_response<R>(response: AnyMessage) -> Result<serde_json::Value, serde_json::Error>
where
    R: Request,
    R::Response: Serialize,
{
    let response = response.downcast::<R::Response>().map_err(|_| {
        <serde_json::Error as serde::ser::Error>::custom(format!(
            "handler for {} returned an unexpected response type",
            type_name::<R>()
        ))
    })?;
    serde_json::to_value(&*response)
}

/// A registered request type and the response type its handler produces.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub descriptor: TypeDescriptor,
    pub type_id: TypeId,
    pub response: TypeDescriptor,
    pub response_type_id: TypeId,
    codec: Option<JsonCodec>,
    /// Position in the registry that produced this descriptor.
    registration: Option<usize>,
}

impl RequestDescriptor {
    pub fn of<R: Request>() -> Self {
        Self {
            descriptor: TypeDescriptor::of::<R>(),
            type_id: TypeId::of::<R>(),
            response: TypeDescriptor::of::<R::Response>(),
            response_type_id: TypeId::of::<R::Response>(),
            codec: None,
            registration: None,
        }
    }

    pub fn with_codec(mut self, codec: JsonCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    /// JSON codec, present when registered through `json_request_handler`.
    pub fn codec(&self) -> Option<&JsonCodec> {
        self.codec.as_ref()
    }

    pub fn is<R: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<R>()
    }

    pub fn responds_with<T: 'static>(&self) -> bool {
        self.response_type_id == TypeId::of::<T>()
    }
}

type HandlerFactory = Arc<dyn Fn() -> Arc<dyn ErasedRequestHandler> + Send + Sync>;

struct RequestEntry {
    descriptor: RequestDescriptor,
    factory: HandlerFactory,
}

/// Kind of a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    Request,
    Notification,
}

/// Listing entry describing one registration.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub kind: RegistrationKind,
    pub identity: String,
    pub message: &'static str,
    pub handler: &'static str,
    /// Whether the request is reachable by identity with a JSON payload.
    pub dynamic: bool,
}

/// Startup-time builder for [`HandlerRegistry`].
pub struct RegistryBuilder {
    options: Arc<MediatorOptions>,
    requests: Vec<RequestEntry>,
    notifications: Vec<Arc<dyn ErasedNotificationHandler>>,
    listing: Vec<Registration>,
}

impl RegistryBuilder {
    pub fn new(options: Arc<MediatorOptions>) -> Self {
        Self {
            options,
            requests: Vec::new(),
            notifications: Vec::new(),
            listing: Vec::new(),
        }
    }

    /// Register `R` with a factory producing a fresh handler per scope.
    pub fn request_handler<R, H, F>(self, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.push_request::<R, H, F>(RequestDescriptor::of::<R>(), factory)
    }

    /// Like [`request_handler`](Self::request_handler), and also reachable
    /// through `Mediator::send_json`.
    pub fn json_request_handler<R, H, F>(self, factory: F) -> Self
    where
        R: Request + DeserializeOwned,
        R::Response: Serialize,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let descriptor = RequestDescriptor::of::<R>().with_codec(JsonCodec::of::<R>());
        self.push_request::<R, H, F>(descriptor, factory)
    }

    fn push_request<R, H, F>(mut self, mut descriptor: RequestDescriptor, factory: F) -> Self
    where
        R: Request,
        H: RequestHandler<R> + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        let identity = MessageIdentity::resolve(&descriptor.descriptor, &self.options);
        debug!(%identity, handler = type_name::<H>(), "registered request handler");
        self.listing.push(Registration {
            kind: RegistrationKind::Request,
            identity: identity.to_string(),
            message: descriptor.descriptor.full_name,
            handler: type_name::<H>(),
            dynamic: descriptor.codec.is_some(),
        });
        descriptor.registration = Some(self.requests.len());
        let factory: HandlerFactory = Arc::new(move || -> Arc<dyn ErasedRequestHandler> {
            Arc::new(RequestAdapter::<R, H>::new(factory()))
        });
        self.requests.push(RequestEntry {
            descriptor,
            factory,
        });
        self
    }

    /// Register a shared handler under the identity derived for `N`.
    pub fn notification_handler<N, H>(self, handler: H) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let identity = MessageIdentity::of::<N>(&self.options);
        self.notification_handler_as::<N, H>(identity, handler)
    }

    /// Register a shared handler under an explicitly declared identity.
    pub fn notification_handler_as<N, H>(
        mut self,
        identity: impl Into<MessageIdentity>,
        handler: H,
    ) -> Self
    where
        N: Notification,
        H: NotificationHandler<N> + 'static,
    {
        let identity = identity.into();
        debug!(%identity, handler = type_name::<H>(), "registered notification handler");
        self.listing.push(Registration {
            kind: RegistrationKind::Notification,
            identity: identity.to_string(),
            message: type_name::<N>(),
            handler: type_name::<H>(),
            dynamic: false,
        });
        self.notifications
            .push(Arc::new(NotificationAdapter::<N, H>::new(identity, handler)));
        self
    }

    pub fn build(self) -> HandlerRegistry {
        HandlerRegistry {
            options: self.options,
            requests: self.requests,
            notifications: self.notifications,
            listing: self.listing,
        }
    }
}

/// Frozen registration table.
pub struct HandlerRegistry {
    options: Arc<MediatorOptions>,
    requests: Vec<RequestEntry>,
    notifications: Vec<Arc<dyn ErasedNotificationHandler>>,
    listing: Vec<Registration>,
}

impl HandlerRegistry {
    pub fn builder(options: Arc<MediatorOptions>) -> RegistryBuilder {
        RegistryBuilder::new(options)
    }

    /// The options identities were derived with at registration.
    pub fn options(&self) -> &Arc<MediatorOptions> {
        &self.options
    }

    /// Every registration, in registry order.
    pub fn registrations(&self) -> &[Registration] {
        &self.listing
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }
}

impl TypeScanner for HandlerRegistry {
    fn candidate_types(&self, modules: &[String]) -> Vec<RequestDescriptor> {
        self.requests
            .iter()
            .filter(|entry| entry.descriptor.descriptor.in_modules(modules))
            .map(|entry| entry.descriptor.clone())
            .collect()
    }
}

impl HandlerProvider for HandlerRegistry {
    fn notification_handlers(&self) -> Vec<Arc<dyn ErasedNotificationHandler>> {
        self.notifications.clone()
    }

    fn create_scope(&self) -> Box<dyn ResolutionScope + '_> {
        Box::new(RegistryScope {
            registry: self,
            resolved: HashMap::new(),
        })
    }
}

/// Scope over a [`HandlerRegistry`]. Each registration is instantiated at
/// most once per scope.
struct RegistryScope<'a> {
    registry: &'a HandlerRegistry,
    resolved: HashMap<usize, Arc<dyn ErasedRequestHandler>>,
}

impl RegistryScope<'_> {
    /// The registration `request` came from, or the first registration of
    /// its type when it was built outside this registry.
    fn entry_index(&self, request: &RequestDescriptor) -> Option<usize> {
        let requests = &self.registry.requests;
        match request.registration {
            Some(index) => requests
                .get(index)
                .filter(|entry| entry.descriptor.type_id == request.type_id)
                .map(|_| index),
            None => requests
                .iter()
                .position(|entry| entry.descriptor.type_id == request.type_id),
        }
    }
}

impl ResolutionScope for RegistryScope<'_> {
    fn resolve_request_handler(
        &mut self,
        request: &RequestDescriptor,
    ) -> Option<Arc<dyn ErasedRequestHandler>> {
        let index = self.entry_index(request)?;
        if let Some(handler) = self.resolved.get(&index) {
            return Some(Arc::clone(handler));
        }
        let handler = (self.registry.requests[index].factory)();
        self.resolved.insert(index, Arc::clone(&handler));
        Some(handler)
    }
}

impl Drop for RegistryScope<'_> {
    fn drop(&mut self) {
        trace!(instances = self.resolved.len(), "released resolution scope");
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("options", &self.options)
            .field("requests", &self.requests.len())
            .field("notifications", &self.notifications.len())
            .finish()
    }
}
