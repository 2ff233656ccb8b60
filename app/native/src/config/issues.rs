//! Load-time diagnostics.
//!
//! Building a model never fails. Every problem found in a document is
//! recorded as a [`ConfigIssue`] and the offending rule is skipped.

use thiserror::Error;

/// A problem found while compiling a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{context}: invalid regex '{pattern}': {message}")]
    InvalidRegex { context: String, pattern: String, message: String },

    #[error("duplicate {kind} '{name}', keeping the first one")]
    DuplicateName { kind: &'static str, name: String },

    #[error("{kind} without a name")]
    EmptyName { kind: &'static str },

    #[error("{kind} '{name}' is malformed: {message}")]
    InvalidEntry { kind: &'static str, name: String, message: String },

    #[error("tag '{tag}': geometry needs a positive size, got {width}x{height}")]
    InvalidGeometry { tag: String, width: i32, height: i32 },

    #[error("gravity '{name}': {message}")]
    InvalidGravity { name: String, message: String },

    #[error("{context}: unknown gravity '{name}'")]
    UnknownGravity { context: String, name: String },

    #[error("grab '{chain}': {message}")]
    InvalidChain { chain: String, message: String },

    #[error("grab '{chain}': unknown action '{action}'")]
    UnknownAction { chain: String, action: String },

    #[error("grab '{chain}': gravity cycle has no known gravities")]
    EmptyGravityCycle { chain: String },

    #[error("grab '{chain}' is bound twice, the later binding wins")]
    DuplicateChain { chain: String },

    #[error("screen {screen}: unknown panel item '{item}'")]
    UnknownPanelItem { screen: usize, item: String },

    #[error("screen {screen}: only one centered group per panel is supported")]
    ExtraCenter { screen: usize },

    #[error("unknown hook event '{event}'")]
    UnknownHookEvent { event: String },

    #[error("unknown default tag '{name}'")]
    UnknownDefaultTag { name: String },
}

impl ConfigIssue {
    /// Short machine-readable kind, used in JSON output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRegex { .. } => "invalid_regex",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::EmptyName { .. } => "empty_name",
            Self::InvalidEntry { .. } => "invalid_entry",
            Self::InvalidGeometry { .. } => "invalid_geometry",
            Self::InvalidGravity { .. } => "invalid_gravity",
            Self::UnknownGravity { .. } => "unknown_gravity",
            Self::InvalidChain { .. } => "invalid_chain",
            Self::UnknownAction { .. } => "unknown_action",
            Self::EmptyGravityCycle { .. } => "empty_gravity_cycle",
            Self::DuplicateChain { .. } => "duplicate_chain",
            Self::UnknownPanelItem { .. } => "unknown_panel_item",
            Self::ExtraCenter { .. } => "extra_center",
            Self::UnknownHookEvent { .. } => "unknown_hook_event",
            Self::UnknownDefaultTag { .. } => "unknown_default_tag",
        }
    }
}
