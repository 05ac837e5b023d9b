//! Message identity resolution.
//!
//! The identity is the string key handlers are matched on. It is derived from
//! a [`TypeDescriptor`] according to `MediatorOptions::ignore_namespace`, and
//! the same derivation must be used at registration and at dispatch.
//!
//! Two comparison modes exist and must not be mixed up:
//! - request candidates match exactly ([`MessageIdentity::matches_exact`])
//! - notification handlers match ignoring ASCII case
//!   ([`MessageIdentity::matches_ignore_case`])

use std::fmt;

use courier_types::{MediatorOptions, TypeDescriptor};

/// String key derived from a message type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageIdentity(String);

impl MessageIdentity {
    /// Wrap an explicit identity string (e.g. a handler's declared name).
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Derive the identity of `descriptor` under `options`.
    pub fn resolve(descriptor: &TypeDescriptor, options: &MediatorOptions) -> Self {
        if options.ignore_namespace {
            Self(descriptor.name.to_string())
        } else {
            Self(descriptor.full_name.to_string())
        }
    }

    /// Derive the identity of `T` under `options`.
    pub fn of<T: ?Sized>(options: &MediatorOptions) -> Self {
        Self::resolve(&TypeDescriptor::of::<T>(), options)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Exact, case-sensitive comparison used for request candidates.
    pub fn matches_exact(&self, other: &str) -> bool {
        self.0 == other
    }

    /// ASCII case-insensitive comparison used for notification handlers.
    pub fn matches_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl fmt::Display for MessageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for MessageIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MessageIdentity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MessageIdentity {
    fn from(value: String) -> Self {
        Self(value)
    }
}
