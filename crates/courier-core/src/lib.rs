//! Dispatch engine for Courier.
//!
//! This crate resolves message identities, looks up handlers through the
//! `HandlerProvider`/`TypeScanner` ports, and invokes them: one handler per
//! request, awaited; every matching handler per notification, spawned and
//! isolated. It depends only on `courier-types` -- never on the host.

pub mod config;
pub mod erased;
pub mod handler;
pub mod identity;
pub mod mediator;
pub mod registry;

pub use handler::{HandlerError, NotificationHandler, RequestHandler};
pub use identity::MessageIdentity;
pub use mediator::{Mediator, MediatorError, PublishHandle, PublishReport};
pub use registry::{
    HandlerProvider, HandlerRegistry, RegistryBuilder, RequestDescriptor, ResolutionScope,
    TypeScanner,
};
