//! Tagtile - a rule-based policy engine for tiling window managers.
//!
//! Tagtile compiles a JSONC configuration into an immutable model of tags,
//! views, gravities, key chains, panels and hooks, and runs an event-driven
//! engine over it. Window system adapters feed window and input events in
//! and carry the resulting geometry and commands out.
//!
//! - [`config`] - document loading, discovery, model building and watching
//! - [`engine`] - matching, placement, gravity, chains, panels, hooks and the
//!   actor that owns runtime state
//! - [`cli`] - the `tagtile` command line

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod schema;
