//! CLI command definitions for the `courier` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod list;
pub mod run;
pub mod send;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Host process for the Courier in-process mediator.
#[derive(Parser)]
#[command(name = "courier", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Mediator options file.
    #[arg(long, global = true, env = "COURIER_CONFIG", default_value = "courier.toml")]
    pub config: PathBuf,

    /// Output machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the order worker until Ctrl-C (or for a fixed number of iterations).
    Run {
        /// Stop after this many orders.
        #[arg(long)]
        iterations: Option<u64>,

        /// Delay between orders, in milliseconds.
        #[arg(long, default_value_t = 1_000)]
        interval_ms: u64,
    },

    /// Send a request by identity with a JSON payload.
    Send {
        /// Request identity (short or fully qualified, per options).
        identity: String,

        /// JSON request body.
        payload: String,
    },

    /// List registered handlers.
    #[command(alias = "ls")]
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_with_defaults() {
        let cli = Cli::try_parse_from(["courier", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("courier.toml"));
        match cli.command {
            Commands::Run {
                iterations,
                interval_ms,
            } => {
                assert_eq!(iterations, None);
                assert_eq!(interval_ms, 1_000);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn parses_send_with_global_flags() {
        let cli = Cli::try_parse_from([
            "courier",
            "send",
            "PlaceOrder",
            r#"{"customer":"ada"}"#,
            "--json",
            "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Send { ref identity, .. } if identity == "PlaceOrder"));
    }
}
