//! CLI command definitions using Clap.
//!
//! Commands are organized into submodules:
//!
//! - `check` - configuration diagnostics
//! - `config_cmd` - configuration file management
//! - `inspect` - match, gravity, chain and panel queries against a model
//! - `types` - shared argument types
//! - `watch` - the headless engine

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Generator, Shell, generate};

use crate::config::{self, ConfigIssue, LoadedModel};
use crate::error::EngineError;
use crate::schema;

pub mod check;
pub mod config_cmd;
pub mod inspect;
pub mod types;
pub mod watch;

pub use config_cmd::ConfigCommands;
pub use inspect::{ChainArgs, GravityArgs, MatchArgs, PanelArgs};
pub use types::{LogLevel, ScreenIndex};
pub use watch::WatchArgs;

/// Application version from Cargo.toml.
const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tagtile CLI - inspect configurations and run the policy engine.
#[derive(Parser, Debug)]
#[command(name = "tagtile")]
#[command(author, version = APP_VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a custom configuration file.
    ///
    /// Overrides the default configuration file search paths.
    /// Supports JSONC format (JSON with comments).
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<String>,

    /// Log verbosity. `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Warn)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
#[command(next_display_order = None)]
pub enum Commands {
    /// Build the configuration and report diagnostics.
    ///
    /// Exits with an error when the configuration has issues.
    Check {
        /// Output in JSON format.
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Show how a window would be tagged and placed.
    Match(MatchArgs),

    /// Resolve a gravity to pixels.
    Gravity(GravityArgs),

    /// Feed chords through the chain engine and show what fires.
    Chain(ChainArgs),

    /// Lay out a screen panel.
    Panel(PanelArgs),

    /// Configuration file management commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Output the configuration JSON Schema.
    ///
    /// Can be redirected to a file for use with editors that support JSON
    /// Schema validation.
    Schema,

    /// Generate shell completions.
    ///
    /// Usage:
    ///   eval "$(tagtile completions --shell zsh)"
    ///   tagtile completions --shell fish > ~/.config/fish/completions/tagtile.fish
    Completions {
        /// The shell to generate completions for.
        #[arg(long, short, value_enum)]
        shell: Shell,
    },

    /// Run the engine headless, reloading on configuration changes.
    Watch(WatchArgs),
}

impl Cli {
    /// Returns the custom config path if specified via --config flag.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> { self.config.as_ref().map(PathBuf::from) }

    /// Returns the requested log filter.
    #[must_use]
    pub const fn log_level(&self) -> &'static str { self.log_level.as_str() }

    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command execution fails.
    pub fn execute(&self) -> Result<(), EngineError> {
        if let Some(path) = self.config_path() {
            let expanded = config::expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                return Err(EngineError::ConfigError(format!(
                    "Configuration file not found: {}",
                    expanded.display()
                )));
            }
            config::set_custom_config_path(expanded);
        }

        match &self.command {
            Commands::Check { json } => check::execute(*json),
            Commands::Match(args) => inspect::execute_match(args),
            Commands::Gravity(args) => inspect::execute_gravity(args),
            Commands::Chain(args) => inspect::execute_chain(args),
            Commands::Panel(args) => inspect::execute_panel(args),
            Commands::Config(cmd) => config_cmd::execute(cmd),
            Commands::Schema => {
                println!("{}", schema::print_schema());
                Ok(())
            }
            Commands::Completions { shell } => {
                Self::print_completions(*shell);
                Ok(())
            }
            Commands::Watch(args) => watch::execute(args),
        }
    }

    /// Print shell completions to stdout.
    fn print_completions<G: Generator>(generator: G) {
        let mut cmd = Self::command();
        generate(generator, &mut cmd, "tagtile", &mut io::stdout());
    }
}

/// Loads the model, logging every issue found.
pub(crate) fn load_model() -> Result<LoadedModel, EngineError> {
    let loaded = config::load_model(None)?;
    report_issues(&loaded.issues);
    Ok(loaded)
}

/// Logs configuration issues as warnings.
pub(crate) fn report_issues(issues: &[ConfigIssue]) {
    for issue in issues {
        tracing::warn!(kind = issue.kind(), "{issue}");
    }
}
