//! Message taxonomy.
//!
//! Three message shapes exist, all expressed as marker traits with no
//! behavior of their own:
//! - [`Notification`] -- broadcast to zero or more handlers, no response.
//! - [`Request`] with `Response = ()` -- one handler, no response.
//! - [`Request`] with any other `Response` -- one handler, typed response.

/// A broadcast event delivered to every matching notification handler.
///
/// Notifications are shared read-only across concurrently running handlers,
/// so they must be `Send + Sync + 'static`.
pub trait Notification: Send + Sync + 'static {}

/// A command or query handled by at most one request handler.
///
/// Void requests declare `type Response = ();`.
pub trait Request: Send + 'static {
    /// The value produced by the request's handler.
    type Response: Send + 'static;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl Notification for Ping {}

    struct Archive;
    impl Request for Archive {
        type Response = ();
    }

    struct Lookup;
    impl Request for Lookup {
        type Response = Option<u64>;
    }

    fn assert_notification<N: Notification>() {}
    fn response_of<R: Request>(value: R::Response) -> R::Response {
        value
    }

    #[test]
    fn markers_are_implementable_on_plain_structs() {
        assert_notification::<Ping>();
        response_of::<Archive>(());
        assert_eq!(response_of::<Lookup>(Some(7)), Some(7));
    }
}
