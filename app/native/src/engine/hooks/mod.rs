//! Lifecycle hooks and externally registered callbacks.
//!
//! The engine never runs user code itself. Configuration refers to callbacks
//! by name ([`CallbackHandle`]); the embedding application registers typed
//! handler functions under those names in a [`CallbackRegistry`]. Hooks map a
//! [`HookEvent`] to callback handles, and the [`HookDispatcher`] fires them.
//!
//! A handle without a registered handler is logged and skipped.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::engine::state::Client;

/// Lifecycle events exposed to hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookEvent {
    ClientCreate,
    ClientConfigure,
    ClientFocus,
    ClientKill,
    TagCreate,
    TagKill,
    ViewCreate,
    ViewConfigure,
    ViewJump,
    ViewKill,
    Tile,
    Reload,
    Start,
    Exit,
}

impl HookEvent {
    /// Every event, in catalog order.
    pub const ALL: [Self; 14] = [
        Self::ClientCreate,
        Self::ClientConfigure,
        Self::ClientFocus,
        Self::ClientKill,
        Self::TagCreate,
        Self::TagKill,
        Self::ViewCreate,
        Self::ViewConfigure,
        Self::ViewJump,
        Self::ViewKill,
        Self::Tile,
        Self::Reload,
        Self::Start,
        Self::Exit,
    ];

    /// Returns the configuration name of the event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientCreate => "client_create",
            Self::ClientConfigure => "client_configure",
            Self::ClientFocus => "client_focus",
            Self::ClientKill => "client_kill",
            Self::TagCreate => "tag_create",
            Self::TagKill => "tag_kill",
            Self::ViewCreate => "view_create",
            Self::ViewConfigure => "view_configure",
            Self::ViewJump => "view_jump",
            Self::ViewKill => "view_kill",
            Self::Tile => "tile",
            Self::Reload => "reload",
            Self::Start => "start",
            Self::Exit => "exit",
        }
    }

    const fn index(self) -> usize { self as usize }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Error for unknown event names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hook event '{0}'")]
pub struct UnknownHookEvent(pub String);

impl FromStr for HookEvent {
    type Err = UnknownHookEvent;

    /// Accepts `client_create` and `client-create`.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized = name.trim().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == normalized)
            .ok_or_else(|| UnknownHookEvent(name.to_string()))
    }
}

/// Name of an externally registered callback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CallbackHandle(String);

impl CallbackHandle {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self { Self(name.into()) }

    #[must_use]
    pub fn name(&self) -> &str { &self.0 }
}

impl fmt::Display for CallbackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Arguments passed to every callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallbackContext<'a> {
    /// Hook event being fired, `None` for grab callbacks.
    pub event: Option<HookEvent>,
    /// Client the event is about, or the focused client for grabs.
    pub client: Option<&'a Client>,
    /// View name for view events.
    pub view: Option<&'a str>,
    /// Tag name for tag events.
    pub tag: Option<&'a str>,
}

/// A registered handler.
pub type Callback = Arc<dyn Fn(&CallbackContext<'_>) + Send + Sync>;

/// Handlers by callback name.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    handlers: HashMap<String, Callback>,
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("CallbackRegistry").field("handlers", &names).finish()
    }
}

impl CallbackRegistry {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Registers a handler, replacing any handler with the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(&CallbackContext<'_>) + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
    }

    /// Whether a handler exists for `handle`.
    #[must_use]
    pub fn contains(&self, handle: &CallbackHandle) -> bool { self.handlers.contains_key(handle.name()) }

    /// Invokes the handler behind a handle.
    ///
    /// Returns `false` (and logs) when nothing is registered under the name.
    pub fn invoke(&self, handle: &CallbackHandle, context: &CallbackContext<'_>) -> bool {
        let Some(handler) = self.handlers.get(handle.name()) else {
            tracing::warn!(callback = %handle, "no handler registered for callback");
            return false;
        };

        handler(context);
        true
    }
}

/// Callback handles per hook event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookTable {
    handles: [Vec<CallbackHandle>; 14],
}

impl HookTable {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Appends a callback to an event.
    pub fn push(&mut self, event: HookEvent, handle: CallbackHandle) {
        self.handles[event.index()].push(handle);
    }

    /// Returns the callbacks of an event, in declaration order.
    #[must_use]
    pub fn handles(&self, event: HookEvent) -> &[CallbackHandle] { &self.handles[event.index()] }

    /// Returns the total number of hook bindings.
    #[must_use]
    pub fn len(&self) -> usize { self.handles.iter().map(Vec::len).sum() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Fires hooks and grab callbacks through a registry.
#[derive(Debug, Clone, Default)]
pub struct HookDispatcher {
    registry: CallbackRegistry,
}

impl HookDispatcher {
    #[must_use]
    pub const fn new(registry: CallbackRegistry) -> Self { Self { registry } }

    #[must_use]
    pub const fn registry(&self) -> &CallbackRegistry { &self.registry }

    /// Fires every callback bound to `event`.
    ///
    /// Returns the number of callbacks that ran.
    pub fn fire(&self, hooks: &HookTable, event: HookEvent, context: CallbackContext<'_>) -> usize {
        let context = CallbackContext { event: Some(event), ..context };
        let handles = hooks.handles(event);

        if !handles.is_empty() {
            tracing::debug!(%event, callbacks = handles.len(), "firing hook");
        }

        handles.iter().filter(|handle| self.registry.invoke(handle, &context)).count()
    }

    /// Invokes a grab callback.
    pub fn invoke(&self, handle: &CallbackHandle, context: CallbackContext<'_>) -> bool {
        self.registry.invoke(handle, &context)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_event_names_parse_both_spellings() {
        assert_eq!("client_create".parse(), Ok(HookEvent::ClientCreate));
        assert_eq!("view-jump".parse(), Ok(HookEvent::ViewJump));
        assert_eq!("exit".parse(), Ok(HookEvent::Exit));
        assert!("client_moved".parse::<HookEvent>().is_err());
    }

    #[test]
    fn test_catalog_is_complete_and_ordered() {
        for (index, event) in HookEvent::ALL.iter().enumerate() {
            assert_eq!(event.index(), index);
            assert_eq!(event.as_str().parse(), Ok(*event));
        }
    }

    #[test]
    fn test_fire_runs_registered_callbacks_in_order() {
        let calls = Arc::new(parking_lot::Mutex::new(Vec::new()));
        let mut registry = CallbackRegistry::new();
        for name in ["first", "second"] {
            let calls = Arc::clone(&calls);
            registry.register(name, move |ctx: &CallbackContext<'_>| {
                calls.lock().push((name, ctx.event));
            });
        }

        let mut hooks = HookTable::new();
        hooks.push(HookEvent::Start, CallbackHandle::new("first"));
        hooks.push(HookEvent::Start, CallbackHandle::new("second"));

        let dispatcher = HookDispatcher::new(registry);
        assert_eq!(dispatcher.fire(&hooks, HookEvent::Start, CallbackContext::default()), 2);
        assert_eq!(dispatcher.fire(&hooks, HookEvent::Exit, CallbackContext::default()), 0);

        assert_eq!(
            calls.lock().as_slice(),
            &[("first", Some(HookEvent::Start)), ("second", Some(HookEvent::Start))]
        );
    }

    #[test]
    fn test_unregistered_handle_is_skipped() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut registry = CallbackRegistry::new();
        let seen = Arc::clone(&counter);
        registry.register("count", move |_: &CallbackContext<'_>| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let mut hooks = HookTable::new();
        hooks.push(HookEvent::Reload, CallbackHandle::new("missing"));
        hooks.push(HookEvent::Reload, CallbackHandle::new("count"));

        let dispatcher = HookDispatcher::new(registry);
        assert_eq!(dispatcher.fire(&hooks, HookEvent::Reload, CallbackContext::default()), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(!dispatcher.invoke(&CallbackHandle::new("missing"), CallbackContext::default()));
    }

    #[test]
    fn test_hook_table_counts_bindings() {
        let mut hooks = HookTable::new();
        assert!(hooks.is_empty());
        hooks.push(HookEvent::Tile, CallbackHandle::new("a"));
        hooks.push(HookEvent::ViewJump, CallbackHandle::new("b"));
        assert_eq!(hooks.len(), 2);
        assert_eq!(hooks.handles(HookEvent::Tile)[0].name(), "a");
    }
}
