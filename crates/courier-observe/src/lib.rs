//! Observability setup for processes hosting a Courier mediator.

pub mod tracing_setup;

pub use tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
