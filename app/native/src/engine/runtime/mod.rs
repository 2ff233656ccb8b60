//! Engine state and event handling.
//!
//! A [`Runtime`] owns everything that changes while the window manager runs:
//! clients ordered by window id, screens, focus, gravity-cycle cursors, the
//! chord chain machine, the hook dispatcher and the window system. Every
//! handler is synchronous and runs to completion; the
//! [`EngineActor`](crate::engine::actor::EngineActor) feeds it one message at
//! a time.
//!
//! # Reload
//!
//! A reload swaps in a new model between events. Gravity cursors and any
//! partial chain are dropped, every client is placed again, screens keep
//! their active view when a view of the same name still exists, and the
//! `reload` hook fires last.

mod clients;
mod input;

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::engine::chain::{ChainMachine, ChainState};
use crate::engine::gravity::GravityCycles;
use crate::engine::hooks::{CallbackContext, CallbackRegistry, HookDispatcher, HookEvent};
use crate::engine::model::{ConfigModel, Gravity, GravityId, PanelEntry, Tag, View, ViewId};
use crate::engine::panel::{PanelLayout, TextMetrics, expand, layout};
use crate::engine::placement::visible_views;
use crate::engine::state::{Client, ClientId, Rect, Screen};
use crate::engine::window_system::WindowSystem;

/// Screen geometry used until the window system reports real screens.
pub const FALLBACK_SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

/// Requests that reach beyond the runtime, handled by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Request {
    Reload,
    Restart,
    Quit,
}

/// Serializable view of the runtime, for queries and `--json` output.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub clients: Vec<Client>,
    pub screens: Vec<Screen>,
    pub current_screen: usize,
    pub focus: Option<ClientId>,
    pub keychain: String,
    pub chain_state: ChainState,
    pub visible_views: Vec<String>,
}

/// Mutable engine state.
pub struct Runtime {
    model: Arc<ConfigModel>,
    clients: BTreeMap<ClientId, Client>,
    /// Tag names assigned explicitly; these clients skip matching.
    explicit_tags: HashMap<ClientId, Vec<String>>,
    /// Gravities picked with a cycle grab, kept until tag or view membership
    /// changes.
    picked_gravity: HashMap<ClientId, GravityId>,
    screens: Vec<Screen>,
    current_screen: usize,
    focus: Option<ClientId>,
    cycles: GravityCycles,
    chain: ChainMachine,
    hooks: HookDispatcher,
    window_system: Box<dyn WindowSystem>,
    metrics: TextMetrics,
    requests: Vec<Request>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("clients", &self.clients.len())
            .field("screens", &self.screens)
            .field("focus", &self.focus)
            .field("chain", &self.chain.state())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Creates a runtime with one fallback screen.
    #[must_use]
    pub fn new(
        model: Arc<ConfigModel>,
        registry: CallbackRegistry,
        window_system: Box<dyn WindowSystem>,
    ) -> Self {
        let chain = ChainMachine::new(model.options().chain_timeout);
        let views = visible_views(&model, std::iter::empty());
        let screen = make_screen(&model, 0, FALLBACK_SCREEN, initial_view(&model, 0), &views);

        Self {
            model,
            clients: BTreeMap::new(),
            explicit_tags: HashMap::new(),
            picked_gravity: HashMap::new(),
            screens: vec![screen],
            current_screen: 0,
            focus: None,
            cycles: GravityCycles::new(),
            chain,
            hooks: HookDispatcher::new(registry),
            window_system,
            metrics: TextMetrics::default(),
            requests: Vec::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[must_use]
    pub const fn model(&self) -> &Arc<ConfigModel> { &self.model }

    /// Returns the clients ordered by window id.
    pub fn clients(&self) -> impl Iterator<Item = &Client> + Clone { self.clients.values() }

    #[must_use]
    pub fn client(&self, id: ClientId) -> Option<&Client> { self.clients.get(&id) }

    #[must_use]
    pub fn screens(&self) -> &[Screen] { &self.screens }

    #[must_use]
    pub const fn current_screen(&self) -> usize { self.current_screen }

    #[must_use]
    pub const fn focus(&self) -> Option<ClientId> { self.focus }

    #[must_use]
    pub fn focused_client(&self) -> Option<&Client> {
        self.focus.and_then(|id| self.clients.get(&id))
    }

    /// Returns the partial chain as written in configuration.
    #[must_use]
    pub fn keychain(&self) -> String { self.chain.keychain() }

    #[must_use]
    pub const fn chain_state(&self) -> ChainState { self.chain.state() }

    /// Returns when the partial chain expires, if one is pending.
    #[must_use]
    pub fn chain_deadline(&self) -> Option<Instant> { self.chain.deadline() }

    /// Removes and returns the pending requests.
    pub fn take_requests(&mut self) -> Vec<Request> { std::mem::take(&mut self.requests) }

    /// Views listed in panels: static views plus dynamic views with members.
    #[must_use]
    pub fn visible_views(&self) -> Vec<ViewId> { visible_views(&self.model, self.clients.values()) }

    /// Returns a serializable copy of the state.
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            clients: self.clients.values().cloned().collect(),
            screens: self.screens.clone(),
            current_screen: self.current_screen,
            focus: self.focus,
            keychain: self.chain.keychain(),
            chain_state: self.chain.state(),
            visible_views: self
                .visible_views()
                .into_iter()
                .map(|id| self.model.view(id).name().to_string())
                .collect(),
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Fires the `start` hook.
    pub fn start(&mut self) {
        tracing::debug!(screens = self.screens.len(), "engine started");
        self.fire(HookEvent::Start, CallbackContext::default());
    }

    /// Fires the `exit` hook.
    pub fn exit(&mut self) {
        tracing::debug!(clients = self.clients.len(), "engine exiting");
        self.fire(HookEvent::Exit, CallbackContext::default());
    }

    /// Replaces the screen list.
    ///
    /// Screens keep their active view by position; new screens show the view
    /// at their index, or the default view. Clients on removed screens move
    /// to the first screen. An empty list is ignored.
    pub fn set_screens(&mut self, geometries: &[Rect]) {
        if geometries.is_empty() {
            tracing::warn!("ignoring empty screen list");
            return;
        }

        let views = self.visible_views();
        let previous = std::mem::take(&mut self.screens);
        self.screens = geometries
            .iter()
            .enumerate()
            .map(|(index, geometry)| {
                let view = previous
                    .get(index)
                    .map_or_else(|| initial_view(&self.model, index), |screen| screen.active_view);
                make_screen(&self.model, index, *geometry, view, &views)
            })
            .collect();

        let count = self.screens.len();
        for client in self.clients.values_mut() {
            if client.screen >= count {
                client.screen = 0;
            }
        }
        if self.current_screen >= count {
            self.current_screen = 0;
        }

        tracing::debug!(screens = count, "screens changed");
        self.retile_all();
    }

    /// Swaps in a new model.
    pub fn reload(&mut self, model: Arc<ConfigModel>) {
        let old = std::mem::replace(&mut self.model, model);

        self.chain = ChainMachine::new(self.model.options().chain_timeout);
        self.cycles.clear();
        self.carry_over(&old);

        let views = self.visible_views();
        self.screens = self
            .screens
            .iter()
            .map(|screen| {
                let name = old.view(screen.active_view).name();
                let view = self.model.view_by_name(name).map_or(self.model.default_view(), View::id);
                make_screen(&self.model, screen.id, screen.geometry, view, &views)
            })
            .collect();

        let ids: Vec<ClientId> = self.clients.keys().copied().collect();
        for id in ids {
            self.replace_client(id);
        }

        self.fire_model_diff(&old);
        tracing::info!(
            tags = self.model.tags().len(),
            views = self.model.views().len(),
            grabs = self.model.grabs().len(),
            clients = self.clients.len(),
            "model swapped"
        );
        self.fire(HookEvent::Reload, CallbackContext::default());
    }

    /// Translates per-client ids of the old model into the current one by
    /// name. Tags, views and picked gravities that no longer exist are
    /// dropped.
    fn carry_over(&mut self, old: &ConfigModel) {
        let model = &self.model;
        for client in self.clients.values_mut() {
            client.tags = client
                .tags
                .iter()
                .filter_map(|tag| model.tag_by_name(old.tag(*tag).name()).map(Tag::id))
                .collect();
            client.views = client
                .views
                .iter()
                .filter_map(|view| model.view_by_name(old.view(*view).name()).map(View::id))
                .collect();
            client.gravity = client
                .gravity
                .and_then(|id| model.gravity_by_name(old.gravity(id).name()))
                .map(Gravity::id);
        }

        self.picked_gravity.retain(|_, gravity| {
            match model.gravity_by_name(old.gravity(*gravity).name()) {
                Some(new) => {
                    *gravity = new.id();
                    true
                }
                None => false,
            }
        });
    }

    /// Fires kill hooks for tags and views that disappeared, create hooks
    /// for new ones and configure hooks for views whose pattern or tags
    /// changed.
    fn fire_model_diff(&self, old: &ConfigModel) {
        for tag in old.tags().iter().filter(|tag| self.model.tag_by_name(tag.name()).is_none()) {
            self.fire(HookEvent::TagKill, CallbackContext { tag: Some(tag.name()), ..Default::default() });
        }
        for tag in self.model.tags().iter().filter(|tag| old.tag_by_name(tag.name()).is_none()) {
            self.fire(HookEvent::TagCreate, CallbackContext { tag: Some(tag.name()), ..Default::default() });
        }
        for view in old.views().iter().filter(|view| self.model.view_by_name(view.name()).is_none()) {
            self.fire(HookEvent::ViewKill, CallbackContext { view: Some(view.name()), ..Default::default() });
        }
        for view in self.model.views().iter().filter(|view| old.view_by_name(view.name()).is_none()) {
            self.fire(
                HookEvent::ViewCreate,
                CallbackContext { view: Some(view.name()), ..Default::default() },
            );
        }
        for view in self.model.views() {
            let Some(previous) = old.view_by_name(view.name()) else { continue };
            if view_changed(old, previous, &self.model, view) {
                self.fire(
                    HookEvent::ViewConfigure,
                    CallbackContext { view: Some(view.name()), ..Default::default() },
                );
            }
        }
    }

    // ========================================================================
    // Panels
    // ========================================================================

    /// Lays out the top or bottom panel of a screen.
    ///
    /// `width` defaults to the screen width. Screens without panel
    /// declarations get a hidden layout.
    #[must_use]
    pub fn panel(&self, screen: usize, bottom: bool, width: Option<u32>) -> PanelLayout {
        let Some(panels) = self.model.screen_panels(screen) else {
            return PanelLayout::hidden();
        };
        let entries = if bottom { &panels.bottom } else { &panels.top };

        let views = self.visible_views();
        let slots = expand(entries, &views, self.model.sublets());

        let total = width
            .or_else(|| {
                self.screens.get(screen).map(|s| u32::try_from(s.geometry.width).unwrap_or(0))
            })
            .unwrap_or(0);
        let title = self.focused_client().map_or("", |client| client.attributes.name.as_str());
        let keychain = self.chain.keychain();

        layout(&slots, total, self.model.options().panel_height, |cell| {
            self.metrics.cell_width(&self.model, cell, title, &keychain)
        })
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn fire(&self, event: HookEvent, context: CallbackContext<'_>) {
        self.hooks.fire(self.model.hooks(), event, context);
    }

    fn fire_for_client(&self, event: HookEvent, id: ClientId) {
        let client = self.clients.get(&id);
        self.fire(event, CallbackContext { client, ..Default::default() });
    }

    /// Returns the screen at `index`, or the first one.
    fn screen(&self, index: usize) -> Screen {
        self.screens
            .get(index)
            .or_else(|| self.screens.first())
            .cloned()
            .unwrap_or_else(|| {
                make_screen(&self.model, 0, FALLBACK_SCREEN, self.model.default_view(), &[])
            })
    }
}

/// Whether a view kept its name across a reload but shows something else.
fn view_changed(old: &ConfigModel, before: &View, model: &ConfigModel, after: &View) -> bool {
    let names = |model: &ConfigModel, view: &View| -> Vec<String> {
        view.tags().iter().map(|tag| model.tag(*tag).name().to_string()).collect()
    };

    before.pattern() != after.pattern() || names(old, before) != names(model, after)
}

/// View shown by a new screen.
fn initial_view(model: &ConfigModel, index: usize) -> ViewId {
    if index == 0 {
        return model.default_view();
    }
    model.view_at(index).map_or(model.default_view(), View::id)
}

/// Builds a screen, deriving its usable area.
///
/// The area is the geometry minus the padding option, minus one panel
/// height for each panel that lays out at least one cell with `views`.
fn make_screen(
    model: &ConfigModel,
    index: usize,
    geometry: Rect,
    active_view: ViewId,
    views: &[ViewId],
) -> Screen {
    let options = model.options();
    let padding = options.padding;
    let mut area = geometry.shrink(padding.left, padding.right, padding.top, padding.bottom);

    let shown = |entries: &[PanelEntry]| !expand(entries, views, model.sublets()).is_empty();
    let panels = model.screen_panels(index);
    let top_panel = panels.is_some_and(|panels| shown(&panels.top));
    let bottom_panel = panels.is_some_and(|panels| shown(&panels.bottom));
    let height = i32::try_from(options.panel_height).unwrap_or(0);

    if top_panel {
        area = area.shrink(0, 0, height, 0);
    }
    if bottom_panel {
        area = area.shrink(0, 0, 0, height);
    }

    Screen { id: index, geometry, area, active_view, top_panel, bottom_panel }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use parking_lot::Mutex;

    use super::*;
    use crate::config::build_model;
    use crate::engine::model::{Chord, Modifiers, WindowAttributes};
    use crate::engine::panel::PanelCell;
    use crate::engine::window_system::RecordingWindowSystem;

    pub(super) type Events = Arc<Mutex<Vec<(Option<HookEvent>, Option<ClientId>)>>>;

    pub(super) const CONFIG: &str = r#"{
        "options": { "defaultTag": "default", "chainTimeoutMs": 500 },
        "gravities": { "keep": [0, 0, 0, 0] },
        "screens": [
            { "top": ["views", "title", "spacer", "keychain", "spacer", "tray", "sublets"] }
        ],
        "tags": [
            { "name": "terms", "match": "xterm|urxvt" },
            { "name": "browser", "match": "firefox", "gravity": "left" },
            { "name": "fixed", "match": "fixed", "geometry": [10, 10, 100, 100] },
            { "name": "gimp_image", "match": { "role": "gimp-image-window" } },
            { "name": "editor", "match": "vim" }
        ],
        "views": [
            { "name": "terms", "match": "terms|default|fixed" },
            { "name": "www", "match": "browser" },
            { "name": "gimp", "match": "gimp_.*", "dynamic": true },
            { "name": "dev", "match": "editor" }
        ],
        "grabs": {
            "W-Return": { "exec": "xterm" },
            "C-y": { "exec": "short" },
            "C-y Return": { "exec": "long" },
            "W-KP_7": ["top_left", "top_left66", "top_left33"],
            "W-KP_4": ["left", "left66", "left33"],
            "W-KP_6": ["right", "right66", "right33"],
            "W-KP_5": ["left", "keep"],
            "S-F2": { "callback": "record" }
        },
        "hooks": {
            "client_create": "record",
            "client_configure": "record",
            "client_focus": "record",
            "client_kill": "record",
            "tag_create": "record",
            "tag_kill": "record",
            "view_create": "record",
            "view_configure": "record",
            "view_kill": "record",
            "view_jump": "record",
            "tile": "record",
            "reload": "record",
            "start": "record",
            "exit": "record"
        }
    }"#;

    /// A runtime over [`CONFIG`] whose `record` callback logs
    /// `(event, client)` pairs.
    pub(super) fn fixture() -> (Runtime, RecordingWindowSystem, Events) {
        let events: Events = Arc::default();
        let mut registry = CallbackRegistry::new();
        let log = Arc::clone(&events);
        registry.register("record", move |ctx: &CallbackContext<'_>| {
            log.lock().push((ctx.event, ctx.client.map(|client| client.id)));
        });

        let recorder = RecordingWindowSystem::new();
        let runtime =
            Runtime::new(Arc::new(build_model(CONFIG)), registry, Box::new(recorder.clone()));
        (runtime, recorder, events)
    }

    pub(super) fn window(id: u64, name: &str) -> WindowAttributes { WindowAttributes::new(id, name) }

    #[test]
    fn test_start_and_exit_hooks() {
        let (mut runtime, _, events) = fixture();
        runtime.start();
        runtime.exit();
        assert_eq!(
            events.lock().as_slice(),
            &[(Some(HookEvent::Start), None), (Some(HookEvent::Exit), None)]
        );
    }

    #[test]
    fn test_screens_get_usable_areas() {
        let (mut runtime, _, _) = fixture();
        assert_eq!(runtime.screens().len(), 1);
        assert_eq!(runtime.screens()[0].area, Rect::new(0, 18, 1920, 1062));

        runtime.set_screens(&[Rect::new(0, 0, 1280, 800), Rect::new(1280, 0, 1024, 768)]);
        let screens = runtime.screens();
        assert_eq!(screens[0].area, Rect::new(0, 18, 1280, 782));
        assert!(screens[0].top_panel);
        assert_eq!(screens[1].area, Rect::new(1280, 0, 1024, 768));
        assert!(!screens[1].top_panel);

        runtime.set_screens(&[]);
        assert_eq!(runtime.screens().len(), 2);
    }

    #[test]
    fn test_clients_on_removed_screens_move_to_first() {
        let (mut runtime, _, _) = fixture();
        runtime.set_screens(&[Rect::new(0, 0, 1280, 800), Rect::new(1280, 0, 1024, 768)]);
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);
        runtime.perform(crate::engine::model::SymbolicAction::WindowMoveToScreen(2));
        assert_eq!(runtime.client(id).unwrap().screen, 1);

        runtime.set_screens(&[Rect::new(0, 0, 1280, 800)]);
        let client = runtime.client(id).unwrap();
        assert_eq!(client.screen, 0);
        assert_eq!(client.geometry, Some(Rect::new(0, 18, 1280, 782)));
    }

    #[test]
    fn test_reload_swaps_model_and_replaces_clients() {
        let (mut runtime, _, events) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.chord(&Chord::key(Modifiers::CONTROL, "y"), Instant::now());
        assert_eq!(runtime.chain_state(), ChainState::Ambiguous);
        events.lock().clear();

        let model = build_model(
            r#"{
                "options": { "defaultTag": "default" },
                "tags": [ { "name": "terms", "match": "urxvt" } ],
                "views": [ { "name": "shells", "match": "default|terms" } ],
                "hooks": {
                    "tag_kill": "record",
                    "view_kill": "record",
                    "view_create": "record",
                    "reload": "record"
                }
            }"#,
        );
        runtime.reload(Arc::new(model));

        assert_eq!(runtime.chain_state(), ChainState::Idle);
        let model = runtime.model().clone();
        let client = runtime.client(id).unwrap();
        assert_eq!(client.tags.as_slice(), &[model.default_tag()]);
        assert_eq!(model.view(runtime.screens()[0].active_view).name(), "shells");
        // No screens key: the first screen gets the stock top panel.
        assert!(runtime.screens()[0].top_panel);

        let events = events.lock();
        let count = |event| events.iter().filter(|(e, _)| *e == Some(event)).count();
        assert_eq!(count(HookEvent::TagKill), 4);
        assert_eq!(count(HookEvent::ViewKill), 4);
        assert_eq!(count(HookEvent::ViewCreate), 1);
        assert_eq!(events.last(), Some(&(Some(HookEvent::Reload), None)));
    }

    #[test]
    fn test_reload_fires_view_configure_for_changed_views() {
        let (mut runtime, _, events) = fixture();
        events.lock().clear();

        let edited = CONFIG.replace(r#""match": "terms|default|fixed""#, r#""match": "terms|default""#);
        runtime.reload(Arc::new(build_model(&edited)));

        let events = events.lock();
        let count = |event| events.iter().filter(|(e, _)| *e == Some(event)).count();
        assert_eq!(count(HookEvent::ViewConfigure), 1);
        assert_eq!(count(HookEvent::ViewCreate), 0);
        assert_eq!(count(HookEvent::ViewKill), 0);
    }

    #[test]
    fn test_reload_keeps_picked_gravity_of_unchanged_clients() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);
        runtime.chord(&Chord::key(Modifiers::SUPER, "KP_7"), Instant::now());
        let picked = runtime.client(id).unwrap().geometry;

        runtime.reload(Arc::new(build_model(CONFIG)));

        let client = runtime.client(id).unwrap();
        assert_eq!(runtime.model().gravity(client.gravity.unwrap()).name(), "top_left");
        assert_eq!(client.geometry, picked);
    }

    #[test]
    fn test_panel_without_cells_reserves_no_space() {
        let model = build_model(r#"{ "screens": [ { "top": ["sublets"], "bottom": ["title"] } ] }"#);
        let runtime = Runtime::new(
            Arc::new(model),
            CallbackRegistry::new(),
            Box::new(RecordingWindowSystem::new()),
        );

        let screen = &runtime.screens()[0];
        assert!(!screen.top_panel);
        assert!(screen.bottom_panel);
        assert_eq!(screen.area, Rect::new(0, 0, 1920, 1062));
        assert!(runtime.panel(0, false, None).hidden);
        assert!(!runtime.panel(0, true, None).hidden);
    }

    #[test]
    fn test_top_panel_fills_screen_width() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        let panel = runtime.panel(0, false, None);
        assert!(!panel.hidden);
        assert_eq!(panel.width, 1920);
        assert_eq!(panel.height, 18);
        assert_eq!(panel.placements.iter().map(|p| p.width).sum::<u32>(), 1920);

        let buttons: Vec<&str> = panel
            .placements
            .iter()
            .filter_map(|p| match p.cell {
                PanelCell::ViewButton(view) => Some(runtime.model().view(view).name()),
                _ => None,
            })
            .collect();
        assert_eq!(buttons, ["terms", "www", "dev"]);

        let title = panel.placements.iter().find(|p| p.cell == PanelCell::Title).unwrap();
        assert_eq!(title.width, TextMetrics::default().text_width("xterm"));
    }

    #[test]
    fn test_missing_panels_are_hidden() {
        let (runtime, _, _) = fixture();
        assert!(runtime.panel(0, true, None).hidden);
        assert!(runtime.panel(3, false, Some(800)).hidden);
    }

    #[test]
    fn test_snapshot_lists_visible_views() {
        let (mut runtime, _, _) = fixture();
        assert_eq!(runtime.snapshot().visible_views, ["terms", "www", "dev"]);

        runtime.client_created(window(2, "gimp").with_role("gimp-image-window"), false);
        let snapshot = runtime.snapshot();
        assert_eq!(snapshot.visible_views, ["terms", "www", "gimp", "dev"]);
        assert_eq!(snapshot.clients.len(), 1);
        assert_eq!(snapshot.keychain, "");
    }
}
