//! Tagtile policy engine.
//!
//! The engine decides which tags a window gets, which views show it, where
//! it goes, what a key chain does and how panels are laid out. Drawing and
//! talking to the display server are left to a [`WindowSystem`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │            Window system adapter / config watcher           │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ mpsc::Sender<EngineMessage>
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Engine Actor                           │
//! │  - Owns the Runtime (clients, screens, focus, chains)       │
//! │  - Processes messages sequentially                          │
//! │  - Wakes on the ambiguous chain deadline                    │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ Arc<ConfigModel> (read-only)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  rules · placement · gravity · chain · panel · hooks        │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ configure / perform / spawn
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      WindowSystem                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod actor;
pub mod chain;
pub mod gravity;
pub mod hooks;
pub mod model;
pub mod panel;
pub mod placement;
pub mod rules;
pub mod runtime;
pub mod state;
pub mod window_system;

pub use actor::{ActorError, EngineActor, EngineHandle, EngineMessage, EngineQuery, QueryResult};
pub use hooks::{CallbackContext, CallbackRegistry, HookEvent};
pub use model::ConfigModel;
pub use runtime::{EngineSnapshot, Request, Runtime};
pub use window_system::{HeadlessWindowSystem, RecordingWindowSystem, WindowSystem};
