//! The boundary between the engine and the display server.
//!
//! The engine decides; a [`WindowSystem`] carries the decisions out. The
//! headless implementation logs geometry changes and spawns commands, which
//! is what `tagtile watch` uses. Tests use [`RecordingWindowSystem`].

use std::process::{Command, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::engine::model::SymbolicAction;
use crate::engine::state::{Client, ClientFlags, ClientId, Rect};
use crate::error::EngineError;

/// Side effects the engine asks for.
pub trait WindowSystem: Send {
    /// Applies a client's geometry and flags.
    fn configure(&mut self, client: &Client);

    /// Carries out a built-in action the engine does not model itself.
    fn perform(&mut self, action: SymbolicAction, client: Option<&Client>);

    /// Starts a shell command without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be started.
    fn spawn(&mut self, command: &str) -> Result<(), EngineError>;
}

/// Starts `command` through `sh -c` and reaps it on a background thread.
///
/// A leading `~` is expanded first.
///
/// # Errors
///
/// Returns [`EngineError::ShellError`] if the shell cannot be started.
pub fn spawn_shell(command: &str) -> Result<(), EngineError> {
    let expanded = shellexpand::tilde(command.trim());

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(expanded.as_ref())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .spawn()
        .map_err(|err| EngineError::ShellError(format!("failed to run '{command}': {err}")))?;

    let description = command.to_string();
    std::thread::spawn(move || match child.wait() {
        Ok(status) if !status.success() => {
            tracing::debug!(command = %description, %status, "command exited with failure");
        }
        Ok(_) => {}
        Err(err) => tracing::warn!(command = %description, error = %err, "failed to wait for command"),
    });

    Ok(())
}

/// Logs every effect and spawns commands for real.
#[derive(Debug, Default)]
pub struct HeadlessWindowSystem;

impl WindowSystem for HeadlessWindowSystem {
    fn configure(&mut self, client: &Client) {
        tracing::info!(
            client = %client.id,
            name = %client.attributes.name,
            geometry = ?client.geometry,
            floating = client.flags.floating,
            "configure"
        );
    }

    fn perform(&mut self, action: SymbolicAction, client: Option<&Client>) {
        tracing::info!(%action, client = ?client.map(|c| c.id), "action");
    }

    fn spawn(&mut self, command: &str) -> Result<(), EngineError> {
        tracing::info!(%command, "spawn");
        spawn_shell(command)
    }
}

/// A recorded side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    Configure { client: ClientId, geometry: Option<Rect>, flags: ClientFlags },
    Perform { action: SymbolicAction, client: Option<ClientId> },
    Spawn { command: String },
}

/// Records effects instead of executing them.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to the engine.
#[derive(Debug, Clone, Default)]
pub struct RecordingWindowSystem {
    effects: Arc<Mutex<Vec<Effect>>>,
}

impl RecordingWindowSystem {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Returns a copy of everything recorded so far.
    #[must_use]
    pub fn effects(&self) -> Vec<Effect> { self.effects.lock().clone() }

    /// Removes and returns everything recorded so far.
    pub fn take(&self) -> Vec<Effect> { std::mem::take(&mut *self.effects.lock()) }

    /// Returns the spawned commands, in order.
    #[must_use]
    pub fn spawned(&self) -> Vec<String> {
        self.effects
            .lock()
            .iter()
            .filter_map(|effect| match effect {
                Effect::Spawn { command } => Some(command.clone()),
                _ => None,
            })
            .collect()
    }
}

impl WindowSystem for RecordingWindowSystem {
    fn configure(&mut self, client: &Client) {
        self.effects.lock().push(Effect::Configure {
            client: client.id,
            geometry: client.geometry,
            flags: client.flags,
        });
    }

    fn perform(&mut self, action: SymbolicAction, client: Option<&Client>) {
        self.effects.lock().push(Effect::Perform { action, client: client.map(|c| c.id) });
    }

    fn spawn(&mut self, command: &str) -> Result<(), EngineError> {
        self.effects.lock().push(Effect::Spawn { command: command.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_clones_share_log() {
        let recorder = RecordingWindowSystem::new();
        let mut engine_side: Box<dyn WindowSystem> = Box::new(recorder.clone());

        engine_side.spawn("xterm").unwrap();
        engine_side.perform(SymbolicAction::Quit, None);

        assert_eq!(recorder.spawned(), vec!["xterm".to_string()]);
        assert_eq!(recorder.effects().len(), 2);
        assert_eq!(recorder.take().len(), 2);
        assert!(recorder.effects().is_empty());
    }

    #[test]
    fn test_spawn_shell_runs_true() {
        assert!(spawn_shell("true").is_ok());
    }
}
