//! Config CLI commands.
//!
//! Commands for managing the tagtile configuration file.

use std::path::PathBuf;

use clap::Subcommand;

use crate::cli::output;
use crate::config::template::{create_config_file, generate_config_template};
use crate::config::{config_paths, custom_config_path, load_document};
use crate::error::EngineError;

/// Config management commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum ConfigCommands {
    /// Initialize a new configuration file with the stock rules.
    ///
    /// Creates a new configuration file at the default location holding the
    /// stock gravities, grabs, tags and views, with the remaining options
    /// documented in comments.
    #[command(
        name = "init",
        after_long_help = r#"Examples:
  tagtile config init              # Create config at default location
  tagtile config init --force      # Overwrite existing config
  tagtile config init --path ~/my-config.jsonc  # Create at custom path
  tagtile config init --stdout     # Print template to stdout"#
    )]
    Init {
        /// Overwrite existing configuration file if it exists.
        #[arg(long, short)]
        force: bool,

        /// Custom path for the configuration file.
        /// If not specified, uses ~/.config/tagtile/config.jsonc
        #[arg(long, short, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Print the configuration template to stdout instead of writing to a file.
        #[arg(long)]
        stdout: bool,
    },

    /// Show the path to the configuration file.
    ///
    /// Displays the paths where tagtile looks for configuration files,
    /// and indicates which one is currently in use (if any).
    Path,

    /// Print the parsed configuration document as JSON.
    ///
    /// Comments are stripped and shorthand entries are shown as written.
    Show,
}

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cmd: &ConfigCommands) -> Result<(), EngineError> {
    match cmd {
        ConfigCommands::Init { force, path, stdout } => {
            if *stdout {
                print_config_template()
            } else {
                init_config(*force, path.clone())
            }
        }
        ConfigCommands::Path => show_config_path(),
        ConfigCommands::Show => show_config(),
    }
}

/// Print the configuration template to stdout.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
fn print_config_template() -> Result<(), EngineError> {
    println!("{}", generate_config_template());
    Ok(())
}

/// Picks where `config init` writes.
fn init_target(custom_path: Option<PathBuf>) -> PathBuf {
    custom_path.unwrap_or_else(|| {
        config_paths().into_iter().next().unwrap_or_else(|| PathBuf::from("config.jsonc"))
    })
}

/// Initialize a new configuration file.
fn init_config(force: bool, custom_path: Option<PathBuf>) -> Result<(), EngineError> {
    let config_path = init_target(custom_path);

    if config_path.exists() && !force {
        return Err(EngineError::ConfigError(format!(
            "Configuration file already exists at: {}\nUse --force to overwrite.",
            config_path.display()
        )));
    }

    create_config_file(&config_path).map_err(|e| {
        EngineError::ConfigError(format!(
            "Failed to create config file {}: {e}",
            config_path.display()
        ))
    })?;

    println!("Configuration file created at: {}", config_path.display());
    println!("\nRun 'tagtile check' after editing it to see any problems.");

    Ok(())
}

/// Show the configuration file path.
#[allow(clippy::unnecessary_wraps)] // Consistent return type with other CLI functions
fn show_config_path() -> Result<(), EngineError> {
    if let Some(path) = custom_config_path() {
        println!("Using configuration from --config:\n\n  {}", path.display());
        return Ok(());
    }

    println!("Configuration file search paths (in priority order):\n");

    let paths = config_paths();
    let mut found_config = false;

    for (i, path) in paths.iter().enumerate() {
        let exists = path.exists();
        let marker = if exists && !found_config {
            found_config = true;
            " (active)"
        } else if exists {
            " (exists)"
        } else {
            ""
        };

        println!("  {}. {}{}", i + 1, path.display(), marker);
    }

    if !found_config {
        println!("\nNo configuration file found, the stock configuration is in use.");
        println!("Run 'tagtile config init' to create one.");
    }

    Ok(())
}

/// Print the active document.
fn show_config() -> Result<(), EngineError> {
    let loaded = load_document(custom_config_path())?;
    match &loaded.path {
        Some(path) => tracing::info!(path = %path.display(), "showing configuration"),
        None => tracing::info!("showing the stock configuration"),
    }
    output::print_json(&loaded.document)
}
