//! CLI module for tagtile.
//!
//! The inspection commands build a model from the configuration and answer
//! one question about it. `watch` runs the engine actor headless.

mod commands;
mod output;

use clap::Parser;
pub use commands::Cli;

use crate::error::EngineError;

/// Runs the CLI.
///
/// Parses command-line arguments and executes the appropriate command. The
/// binary calls [`Cli::execute`] itself so it can install logging first.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();
    cli.execute()
}
