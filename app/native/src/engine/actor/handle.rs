//! Handle for communicating with the engine actor.
//!
//! The `EngineHandle` is the cloneable sending side of the actor's channel.
//! Window system adapters, the config watcher and the CLI all talk to the
//! engine through it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::messages::{EngineMessage, EngineQuery, QueryResult};
use crate::engine::model::{Chord, ConfigModel, WindowAttributes};
use crate::engine::runtime::EngineSnapshot;
use crate::engine::state::{ClientId, Rect};

/// Error types for actor communication.
#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    /// Failed to send message to actor.
    #[error("Failed to send message to actor: channel closed")]
    SendFailed,

    /// Failed to receive response from actor.
    #[error("Failed to receive response from actor: channel closed")]
    ReceiveFailed,

    /// Query timed out.
    #[error("Query timed out after {0:?}")]
    Timeout(Duration),

    /// The actor answered with a result of the wrong kind.
    #[error("Unexpected query result")]
    UnexpectedResult,
}

/// Handle for communicating with the engine actor.
///
/// This handle is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineMessage>,
}

impl EngineHandle {
    pub(crate) const fn new(sender: mpsc::Sender<EngineMessage>) -> Self { Self { sender } }

    // ========================================================================
    // Fire-and-forget sending
    // ========================================================================

    /// Send a message to the actor without waiting for delivery.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed or full.
    pub fn send(&self, msg: EngineMessage) -> Result<(), ActorError> {
        self.sender.try_send(msg).map_err(|_| ActorError::SendFailed)
    }

    /// Send a message from a thread outside the tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn send_blocking(&self, msg: EngineMessage) -> Result<(), ActorError> {
        self.sender.blocking_send(msg).map_err(|_| ActorError::SendFailed)
    }

    // ========================================================================
    // Query methods
    // ========================================================================

    /// Execute a query and wait for the result.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed, or
    /// [`ActorError::ReceiveFailed`] if the actor dropped the response.
    pub async fn query(&self, query: EngineQuery) -> Result<QueryResult, ActorError> {
        let (tx, rx) = oneshot::channel();

        self.sender
            .send(EngineMessage::Query { query, respond_to: tx })
            .await
            .map_err(|_| ActorError::SendFailed)?;

        rx.await.map_err(|_| ActorError::ReceiveFailed)
    }

    /// Execute a query with a timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::Timeout`] if the query doesn't complete in time,
    /// or any error from [`Self::query`].
    pub async fn query_timeout(
        &self,
        query: EngineQuery,
        timeout: Duration,
    ) -> Result<QueryResult, ActorError> {
        tokio::time::timeout(timeout, self.query(query))
            .await
            .map_err(|_| ActorError::Timeout(timeout))?
    }

    /// Get a snapshot of the engine state.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn snapshot(&self) -> Result<EngineSnapshot, ActorError> {
        self.query(EngineQuery::Snapshot)
            .await?
            .into_snapshot()
            .ok_or(ActorError::UnexpectedResult)
    }

    /// Get the partial chain as written in configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if communication with the actor fails.
    pub async fn keychain(&self) -> Result<String, ActorError> {
        self.query(EngineQuery::Keychain)
            .await?
            .into_keychain()
            .ok_or(ActorError::UnexpectedResult)
    }

    // ========================================================================
    // Convenience command methods
    // ========================================================================

    /// Report a new window.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn client_created(
        &self,
        attributes: WindowAttributes,
        transient: bool,
    ) -> Result<(), ActorError> {
        self.send(EngineMessage::ClientCreated { attributes, transient })
    }

    /// Report changed window attributes.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn client_configured(
        &self,
        id: ClientId,
        attributes: WindowAttributes,
    ) -> Result<(), ActorError> {
        self.send(EngineMessage::ClientConfigured { id, attributes })
    }

    /// Report a focus change.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn client_focused(&self, id: ClientId) -> Result<(), ActorError> {
        self.send(EngineMessage::ClientFocused { id })
    }

    /// Report a destroyed window.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn client_killed(&self, id: ClientId) -> Result<(), ActorError> {
        self.send(EngineMessage::ClientKilled { id })
    }

    /// Assign tags to a window by name.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn retag(&self, id: ClientId, tags: Vec<String>) -> Result<(), ActorError> {
        self.send(EngineMessage::ClientTagged { id, tags })
    }

    /// Report a chord.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn chord(&self, chord: Chord) -> Result<(), ActorError> {
        self.send(EngineMessage::Chord(chord))
    }

    /// Show a view by name.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn view_jump(&self, name: &str) -> Result<(), ActorError> {
        self.send(EngineMessage::ViewJump { name: name.to_string() })
    }

    /// Report the screen layout.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn set_screens(&self, screens: Vec<Rect>) -> Result<(), ActorError> {
        self.send(EngineMessage::ScreensChanged { screens })
    }

    /// Swap in a new model.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn reload(&self, model: Arc<ConfigModel>) -> Result<(), ActorError> {
        self.send(EngineMessage::Reload(model))
    }

    /// Stop the actor.
    ///
    /// # Errors
    ///
    /// Returns [`ActorError::SendFailed`] if the channel is closed.
    pub fn shutdown(&self) -> Result<(), ActorError> { self.send(EngineMessage::Shutdown) }

    // ========================================================================
    // Status
    // ========================================================================

    /// Check if the actor is still running.
    #[must_use]
    pub fn is_alive(&self) -> bool { !self.sender.is_closed() }

    /// Get the number of messages waiting in the queue.
    #[must_use]
    pub fn pending_messages(&self) -> usize { self.sender.max_capacity() - self.sender.capacity() }
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("alive", &self.is_alive())
            .field("pending", &self.pending_messages())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
