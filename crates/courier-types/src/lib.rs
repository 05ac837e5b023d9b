//! Shared types for Courier.
//!
//! This crate contains the message taxonomy (`Request`, `Notification`), the
//! `TypeDescriptor` used to derive message identities, the process-wide
//! `MediatorOptions`, and their associated error types.
//!
//! Zero runtime dependencies -- only serde and thiserror.

pub mod descriptor;
pub mod error;
pub mod message;
pub mod options;

pub use descriptor::TypeDescriptor;
pub use error::OptionsError;
pub use message::{Notification, Request};
pub use options::MediatorOptions;
