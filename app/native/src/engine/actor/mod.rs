//! Engine actor module.
//!
//! The engine actor owns the [`Runtime`] and processes messages one at a
//! time on a tokio task, so no engine state is ever shared or locked.
//!
//! Besides the message channel, the loop waits on the deadline of a pending
//! ambiguous key chain; when it passes, the shorter binding fires.
//!
//! # Panic Recovery
//!
//! If a message handler (or a user callback it runs) panics:
//! 1. The panic is caught and logged
//! 2. The actor continues processing subsequent messages
//! 3. State may be partially inconsistent but the engine keeps running

mod handle;
mod messages;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

pub use handle::{ActorError, EngineHandle};
pub use messages::{EngineMessage, EngineQuery, QueryResult};
use tokio::sync::mpsc;

use crate::config::ConfigStore;
use crate::engine::runtime::{Request, Runtime};

/// Channel buffer size for the engine actor.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// What the loop does after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// The engine actor.
pub struct EngineActor {
    runtime: Runtime,
    /// Source of fresh models for `reload` grabs.
    store: Option<Arc<ConfigStore>>,
    receiver: mpsc::Receiver<EngineMessage>,
}

impl EngineActor {
    /// Creates an actor and the handle that talks to it.
    ///
    /// # Arguments
    ///
    /// * `runtime` - Engine state to own
    /// * `store` - Configuration to reload from when a `reload` or `restart`
    ///   grab fires; without one those grabs are logged and ignored
    #[must_use]
    pub fn new(runtime: Runtime, store: Option<Arc<ConfigStore>>) -> (Self, EngineHandle) {
        let (sender, receiver) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        (Self { runtime, store, receiver }, EngineHandle::new(sender))
    }

    /// Spawns the actor on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn spawn(runtime: Runtime, store: Option<Arc<ConfigStore>>) -> EngineHandle {
        tracing::debug!("spawning engine actor");
        let (actor, handle) = Self::new(runtime, store);
        tokio::spawn(actor.run());
        handle
    }

    /// Runs the message loop until shutdown, a `quit` grab, or every handle
    /// is dropped. Fires the `start` hook first and the `exit` hook last.
    pub async fn run(mut self) {
        tracing::trace!("engine message loop starting");
        self.guarded("Start", |runtime| runtime.start());

        loop {
            let deadline = self.runtime.chain_deadline();
            let msg = tokio::select! {
                msg = self.receiver.recv() => msg,
                () = sleep_until(deadline) => {
                    self.guarded("ChainTimeout", |runtime| {
                        runtime.chain_timeout(now());
                    });
                    if self.process_requests() == Flow::Stop {
                        break;
                    }
                    continue;
                }
            };

            let Some(msg) = msg else {
                tracing::debug!("engine channel closed, exiting");
                break;
            };
            if matches!(msg, EngineMessage::Shutdown) {
                tracing::debug!("engine actor received shutdown message");
                break;
            }

            let name = msg.name();
            self.guarded(name, |runtime| handle_message(runtime, msg));
            if self.process_requests() == Flow::Stop {
                break;
            }
        }

        self.guarded("Exit", |runtime| runtime.exit());
    }

    /// Runs `f` on the runtime, logging instead of unwinding on panic.
    fn guarded(&mut self, name: &str, f: impl FnOnce(&mut Runtime)) {
        let result = catch_unwind(AssertUnwindSafe(|| f(&mut self.runtime)));

        if let Err(panic_info) = result {
            let panic_msg = panic_info
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic_info.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());

            tracing::error!(msg = name, panic = %panic_msg, "panic in engine actor");
            tracing::error!("engine recovered from panic, state may be inconsistent");
        }
    }

    /// Handles what grabs asked of the owner.
    fn process_requests(&mut self) -> Flow {
        for request in self.runtime.take_requests() {
            match request {
                Request::Reload | Request::Restart => self.reload_from_store(request),
                Request::Quit => {
                    tracing::info!("quit requested");
                    return Flow::Stop;
                }
            }
        }
        Flow::Continue
    }

    fn reload_from_store(&mut self, request: Request) {
        let Some(store) = &self.store else {
            tracing::warn!(?request, "no configuration store, ignoring request");
            return;
        };

        match store.reload() {
            Ok(loaded) => {
                for issue in &loaded.issues {
                    tracing::warn!(%issue, "configuration issue");
                }
                let model = loaded.model;
                self.guarded("Reload", |runtime| runtime.reload(model));
            }
            Err(err) => {
                tracing::error!(error = %err, "reload failed, keeping current configuration");
            }
        }
    }
}

impl std::fmt::Debug for EngineActor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineActor")
            .field("runtime", &self.runtime)
            .field("store", &self.store.is_some())
            .finish_non_exhaustive()
    }
}

/// Handles a single message.
fn handle_message(runtime: &mut Runtime, msg: EngineMessage) {
    match msg {
        EngineMessage::ClientCreated { attributes, transient } => {
            runtime.client_created(attributes, transient);
        }
        EngineMessage::ClientConfigured { id, attributes } => {
            runtime.client_configured(id, attributes);
        }
        EngineMessage::ClientFocused { id } => {
            runtime.client_focused(id);
        }
        EngineMessage::ClientKilled { id } => {
            runtime.client_killed(id);
        }
        EngineMessage::ClientTagged { id, tags } => {
            runtime.retag(id, &tags);
        }
        EngineMessage::Chord(chord) => {
            runtime.chord(&chord, now());
        }
        EngineMessage::ViewJump { name } => {
            runtime.jump_to_view(&name);
        }
        EngineMessage::ScreensChanged { screens } => runtime.set_screens(&screens),
        EngineMessage::Reload(model) => runtime.reload(model),
        EngineMessage::Query { query, respond_to } => {
            let result = execute_query(runtime, query);
            if respond_to.send(result).is_err() {
                tracing::warn!("failed to send query response (channel closed)");
            }
        }
        // Handled in run()
        EngineMessage::Shutdown => {}
    }
}

fn execute_query(runtime: &Runtime, query: EngineQuery) -> QueryResult {
    match query {
        EngineQuery::Snapshot => QueryResult::Snapshot(Box::new(runtime.snapshot())),
        EngineQuery::Client { id } => QueryResult::Client(runtime.client(id).cloned()),
        EngineQuery::Panel { screen, bottom, width } => {
            QueryResult::Panel(runtime.panel(screen, bottom, width))
        }
        EngineQuery::Keychain => QueryResult::Keychain(runtime.keychain()),
    }
}

/// The current time on the tokio clock, which tests can pause.
fn now() -> std::time::Instant { tokio::time::Instant::now().into_std() }

/// Sleeps until the chain deadline, or forever without one.
async fn sleep_until(deadline: Option<std::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::build_model;
    use crate::engine::hooks::CallbackRegistry;
    use crate::engine::model::{Chord, Modifiers, WindowAttributes};
    use crate::engine::state::ClientId;
    use crate::engine::window_system::RecordingWindowSystem;

    const CONFIG: &str = r#"{
        "options": { "chainTimeoutMs": 500 },
        "tags": { "terms": "xterm", "browser": "firefox" },
        "views": { "terms": "terms|default", "www": "browser" },
        "grabs": {
            "C-y": { "exec": "short" },
            "C-y Return": { "exec": "long" },
            "W-r": "reload",
            "W-q": "quit"
        },
        "hooks": { "client_create": "boom" }
    }"#;

    fn spawn_with(
        registry: CallbackRegistry,
        store: Option<Arc<ConfigStore>>,
    ) -> (EngineHandle, RecordingWindowSystem) {
        let recorder = RecordingWindowSystem::new();
        let runtime =
            Runtime::new(Arc::new(build_model(CONFIG)), registry, Box::new(recorder.clone()));
        (EngineActor::spawn(runtime, store), recorder)
    }

    fn spawn() -> (EngineHandle, RecordingWindowSystem) {
        spawn_with(CallbackRegistry::new(), None)
    }

    fn ctrl_y() -> Chord { Chord::key(Modifiers::CONTROL, "y") }

    #[tokio::test]
    async fn test_actor_spawn_and_shutdown() {
        let (handle, _) = spawn();
        assert!(handle.is_alive());

        handle.shutdown().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_actor_tracks_clients() {
        let (handle, recorder) = spawn();
        handle.client_created(WindowAttributes::new(1, "firefox"), false).unwrap();
        handle.client_focused(ClientId(1)).unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.focus, Some(ClientId(1)));
        assert_eq!(recorder.effects().len(), 1);

        let client = handle
            .query(EngineQuery::Client { id: ClientId(1) })
            .await
            .unwrap()
            .into_client()
            .unwrap();
        assert_eq!(client.map(|c| c.attributes.name), Some("firefox".to_string()));

        handle.shutdown().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_ambiguous_chain_fires_after_timeout() {
        let (handle, recorder) = spawn();
        handle.chord(ctrl_y()).unwrap();
        assert_eq!(handle.keychain().await.unwrap(), "C-y");
        assert!(recorder.spawned().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(handle.keychain().await.unwrap(), "");
        assert_eq!(recorder.spawned(), vec!["short".to_string()]);

        handle.shutdown().unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_longer_chain_wins_within_timeout() {
        let (handle, recorder) = spawn();
        handle.chord(ctrl_y()).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        handle.chord(Chord::key(Modifiers::NONE, "Return")).unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(handle.keychain().await.unwrap(), "");
        assert_eq!(recorder.spawned(), vec!["long".to_string()]);

        handle.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_quit_grab_stops_actor() {
        let (handle, _) = spawn();
        handle.chord(Chord::key(Modifiers::SUPER, "q")).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!handle.is_alive());
    }

    #[tokio::test]
    async fn test_reload_message_swaps_model() {
        let (handle, _) = spawn();
        handle.client_created(WindowAttributes::new(1, "firefox"), false).unwrap();

        let model = build_model(r#"{ "views": { "everything": ".*" } }"#);
        handle.reload(Arc::new(model)).unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.visible_views, ["everything"]);
        assert_eq!(snapshot.clients.len(), 1);

        handle.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_reload_grab_reads_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.jsonc");
        std::fs::write(&path, CONFIG).unwrap();
        let (store, _) = ConfigStore::load(Some(path.as_path())).unwrap();

        let (handle, _) = spawn_with(CallbackRegistry::new(), Some(Arc::new(store)));
        std::fs::write(&path, r#"{ "views": { "all": ".*" }, "grabs": { "W-r": "reload" } }"#)
            .unwrap();
        handle.chord(Chord::key(Modifiers::SUPER, "r")).unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.visible_views, ["all"]);

        handle.shutdown().unwrap();
    }

    #[tokio::test]
    async fn test_actor_survives_panicking_callback() {
        let mut registry = CallbackRegistry::new();
        registry.register("boom", |_| panic!("callback failed"));
        let (handle, _) = spawn_with(registry, None);

        handle.client_created(WindowAttributes::new(1, "xterm"), false).unwrap();
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.clients.len(), 1);
        assert!(handle.is_alive());

        handle.shutdown().unwrap();
    }
}
