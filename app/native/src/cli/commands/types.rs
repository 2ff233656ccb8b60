//! Shared types for CLI commands.

use std::str::FromStr;

/// A 1-based screen index, as users count screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct ScreenIndex(usize);

impl ScreenIndex {
    /// Creates a new `ScreenIndex` from a 1-based index.
    #[must_use]
    pub const fn new(index: usize) -> Self { Self(index) }

    /// Returns the 1-based index value.
    #[must_use]
    pub const fn get(self) -> usize { self.0 }

    /// Returns the 0-based index for internal use.
    #[must_use]
    pub const fn as_zero_based(self) -> usize { self.0.saturating_sub(1) }
}

impl Default for ScreenIndex {
    fn default() -> Self { Self(1) }
}

impl std::fmt::Display for ScreenIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for ScreenIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<usize>() {
            Ok(0) | Err(_) => Err(format!("Invalid screen '{s}'. Expected a positive integer.")),
            Ok(index) => Ok(Self(index)),
        }
    }
}

/// Log verbosity accepted by `--log-level`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_index_parses_positive() {
        let index: ScreenIndex = "2".parse().unwrap();
        assert_eq!(index.get(), 2);
        assert_eq!(index.as_zero_based(), 1);
        assert_eq!(index.to_string(), "2");
    }

    #[test]
    fn test_screen_index_rejects_zero_and_text() {
        assert!("0".parse::<ScreenIndex>().is_err());
        assert!("main".parse::<ScreenIndex>().is_err());
    }

    #[test]
    fn test_screen_index_default_is_first() {
        assert_eq!(ScreenIndex::default().as_zero_based(), 0);
    }

    #[test]
    fn test_log_level_names() {
        assert_eq!(LogLevel::default().as_str(), "warn");
        assert_eq!(LogLevel::Trace.as_str(), "trace");
    }
}
