//! Courier host entry point.
//!
//! Binary name: `courier`
//!
//! Parses CLI arguments, initializes tracing and the mediator, then
//! dispatches to the requested command.

mod cli;
mod services;
mod state;

use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = courier_observe::filter_for_verbosity(cli.verbose, cli.quiet);
    courier_observe::init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let state = AppState::init(&cli.config).await;

    let result = match cli.command {
        Commands::Run {
            iterations,
            interval_ms,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_signal.cancel();
                }
            });

            let summary = cli::run::run_worker(
                &state,
                iterations,
                Duration::from_millis(interval_ms),
                cancel,
            )
            .await?;
            cli::run::print_summary(&summary, cli.json)
        }

        Commands::Send { identity, payload } => {
            cli::send::send_request(&state, &identity, &payload, cli.json).await
        }

        Commands::List => cli::list::list_registrations(&state, cli.json),
    };

    courier_observe::shutdown_tracing();
    result
}
