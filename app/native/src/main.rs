#![allow(clippy::multiple_crate_versions)]

//! Tagtile command line.
//!
//! Inspects configurations (`check`, `match`, `gravity`, `chain`, `panel`)
//! and runs the headless engine (`watch`).

use clap::Parser;
use tagtile_lib::cli::Cli;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level());

    if let Err(err) = cli.execute() {
        eprintln!("tagtile: {err}");
        std::process::exit(1);
    }
}

/// Installs the log subscriber. `RUST_LOG` takes precedence over `level`.
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}
