//! Message types for the engine actor.
//!
//! - `EngineMessage` - window, input and configuration events
//! - `EngineQuery` - requests for state data (with response channel)
//! - `QueryResult` - responses from queries

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::engine::model::{Chord, ConfigModel, WindowAttributes};
use crate::engine::panel::PanelLayout;
use crate::engine::runtime::EngineSnapshot;
use crate::engine::state::{Client, ClientId, Rect};

// ============================================================================
// Engine Messages
// ============================================================================

/// Messages sent to the engine actor.
#[derive(Debug)]
pub enum EngineMessage {
    // ════════════════════════════════════════════════════════════════════════
    // Window Events
    // ════════════════════════════════════════════════════════════════════════
    /// A window was mapped.
    ClientCreated { attributes: WindowAttributes, transient: bool },

    /// A window changed its title, class or role.
    ClientConfigured { id: ClientId, attributes: WindowAttributes },

    /// A window gained focus.
    ClientFocused { id: ClientId },

    /// A window was destroyed.
    ClientKilled { id: ClientId },

    /// Tags were assigned to a window by name.
    ClientTagged { id: ClientId, tags: Vec<String> },

    // ════════════════════════════════════════════════════════════════════════
    // Input and Screens
    // ════════════════════════════════════════════════════════════════════════
    /// A key or button chord was pressed.
    Chord(Chord),

    /// Show a view by name on the current screen.
    ViewJump { name: String },

    /// The screen layout changed.
    ScreensChanged { screens: Vec<Rect> },

    // ════════════════════════════════════════════════════════════════════════
    // Configuration and Control
    // ════════════════════════════════════════════════════════════════════════
    /// Swap in a model built off the event loop.
    Reload(Arc<ConfigModel>),

    /// Query state (response sent via oneshot channel).
    Query { query: EngineQuery, respond_to: oneshot::Sender<QueryResult> },

    /// Stop the actor.
    Shutdown,
}

impl EngineMessage {
    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClientCreated { .. } => "ClientCreated",
            Self::ClientConfigured { .. } => "ClientConfigured",
            Self::ClientFocused { .. } => "ClientFocused",
            Self::ClientKilled { .. } => "ClientKilled",
            Self::ClientTagged { .. } => "ClientTagged",
            Self::Chord(_) => "Chord",
            Self::ViewJump { .. } => "ViewJump",
            Self::ScreensChanged { .. } => "ScreensChanged",
            Self::Reload(_) => "Reload",
            Self::Query { .. } => "Query",
            Self::Shutdown => "Shutdown",
        }
    }
}

// ============================================================================
// Queries
// ============================================================================

/// Queries answered by the actor.
#[derive(Debug, Clone)]
pub enum EngineQuery {
    /// Everything, as a serializable snapshot.
    Snapshot,
    /// One client by id.
    Client { id: ClientId },
    /// A laid out panel.
    Panel { screen: usize, bottom: bool, width: Option<u32> },
    /// The partial chain as written in configuration.
    Keychain,
}

/// Query responses.
#[derive(Debug, Clone)]
pub enum QueryResult {
    Snapshot(Box<EngineSnapshot>),
    Client(Option<Client>),
    Panel(PanelLayout),
    Keychain(String),
}

impl QueryResult {
    /// Try to get a snapshot from the result.
    #[must_use]
    pub fn into_snapshot(self) -> Option<EngineSnapshot> {
        match self {
            Self::Snapshot(snapshot) => Some(*snapshot),
            _ => None,
        }
    }

    /// Try to get a single client from the result.
    #[must_use]
    pub fn into_client(self) -> Option<Option<Client>> {
        match self {
            Self::Client(client) => Some(client),
            _ => None,
        }
    }

    /// Try to get a panel layout from the result.
    #[must_use]
    pub fn into_panel(self) -> Option<PanelLayout> {
        match self {
            Self::Panel(panel) => Some(panel),
            _ => None,
        }
    }

    /// Try to get the keychain from the result.
    #[must_use]
    pub fn into_keychain(self) -> Option<String> {
        match self {
            Self::Keychain(keychain) => Some(keychain),
            _ => None,
        }
    }
}
