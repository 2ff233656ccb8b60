//! Error types for tagtile.
//!
//! Configuration loading has its own [`ConfigError`](crate::config::ConfigError)
//! and the engine actor reports channel failures with
//! [`ActorError`](crate::engine::ActorError). Everything surfaced by the
//! command line is funneled into [`EngineError`].

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::engine::ActorError;

/// Errors that can occur during application execution.
///
/// Serializes as `{ "kind": ..., "message": ... }` for `--json` output.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum EngineError {
    /// Invalid command arguments.
    #[error("{0}")]
    InvalidArguments(String),
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigError(String),
    /// Engine actor failure.
    #[error("Engine error: {0}")]
    ActorError(String),
    /// Window system operation failed.
    #[error("Window system error: {0}")]
    WindowSystemError(String),
    /// IO error.
    #[error("IO error: {0}")]
    IoError(String),
    /// Shell command execution failed.
    #[error("Shell error: {0}")]
    ShellError(String),
    /// Generic command error.
    #[error("{0}")]
    CommandError(String),
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self { Self::IoError(err.to_string()) }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self { Self::CommandError(err.to_string()) }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self { Self::ConfigError(err.to_string()) }
}

impl From<ActorError> for EngineError {
    fn from(err: ActorError) -> Self { Self::ActorError(err.to_string()) }
}

impl From<String> for EngineError {
    fn from(msg: String) -> Self { Self::CommandError(msg) }
}

impl From<&str> for EngineError {
    fn from(msg: &str) -> Self { Self::CommandError(msg.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_arguments_display() {
        let err = EngineError::InvalidArguments("unknown gravity 'nowhere'".to_string());
        assert_eq!(err.to_string(), "unknown gravity 'nowhere'");
    }

    #[test]
    fn test_io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err: EngineError = io_err.into();
        assert!(matches!(err, EngineError::IoError(_)));
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_config_error_conversion() {
        let err: EngineError = ConfigError::NotFound(None).into();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    #[test]
    fn test_actor_error_conversion() {
        let err: EngineError = ActorError::Timeout(std::time::Duration::from_secs(1)).into();
        assert!(matches!(err, EngineError::ActorError(_)));
    }

    #[test]
    fn test_string_conversions() {
        let err: EngineError = "boom".into();
        assert!(matches!(err, EngineError::CommandError(ref msg) if msg == "boom"));

        let err: EngineError = String::from("bang").into();
        assert_eq!(err.to_string(), "bang");
    }

    #[test]
    fn test_serializes_with_kind() {
        let err = EngineError::ShellError("exit 1".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["kind"], "ShellError");
        assert_eq!(json["message"], "exit 1");
    }
}
