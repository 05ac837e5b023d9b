use thiserror::Error;

/// Errors surfaced to callers of `Mediator`.
///
/// A missing handler is never an error: requests resolve to `Ok(None)` and
/// notifications schedule zero tasks.
#[derive(Debug, Error)]
pub enum MediatorError {
    /// The request (or its identity) was missing. Raised before dispatch.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request handler failed. Request failures are not isolated.
    #[error("handler for '{identity}' failed: {source}")]
    Handler {
        identity: String,
        #[source]
        source: anyhow::Error,
    },

    /// The response could not be converted to the caller's type.
    #[error("cannot coerce response of '{identity}': {source}")]
    Coercion {
        identity: String,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON payload did not match the request type (or its response could
    /// not be encoded).
    #[error("invalid payload for '{identity}': {source}")]
    Payload {
        identity: String,
        #[source]
        source: serde_json::Error,
    },
}
