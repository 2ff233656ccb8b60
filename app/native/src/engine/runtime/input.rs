//! Chord input, grab dispatch and the built-in actions.

use std::sync::Arc;
use std::time::Instant;

use smallvec::SmallVec;

use super::{Request, Runtime};
use crate::engine::hooks::{CallbackContext, HookEvent};
use crate::engine::model::{Chord, Direction, GrabAction, GrabId, GravityId, SymbolicAction, ViewId};
use crate::engine::state::{Client, ClientId};

/// Client flags a grab can toggle.
#[derive(Debug, Clone, Copy)]
enum Toggle {
    Floating,
    Full,
    Sticky,
}

impl Runtime {
    // ========================================================================
    // Chains
    // ========================================================================

    /// Feeds one chord and dispatches whatever it completes.
    ///
    /// Returns the dispatched grabs in firing order.
    pub fn chord(&mut self, chord: &Chord, now: Instant) -> SmallVec<[GrabId; 2]> {
        let model = Arc::clone(&self.model);
        let step = self.chain.feed(model.chains(), chord, now);

        tracing::trace!(chord = ?chord, state = ?step.state, fired = step.fired.len(), "chord");
        for grab in &step.fired {
            self.dispatch(*grab);
        }

        step.fired
    }

    /// Resolves the partial chain if its deadline has passed.
    pub fn chain_timeout(&mut self, now: Instant) -> Option<GrabId> {
        let grab = self.chain.expire(now)?;
        tracing::debug!(grab = grab.index(), "ambiguous chain timed out");
        self.dispatch(grab);
        Some(grab)
    }

    /// Drops the partial chain without firing.
    pub fn cancel_chain(&mut self) { self.chain.reset(); }

    /// Runs the action of a grab.
    pub fn dispatch(&mut self, grab: GrabId) {
        let model = Arc::clone(&self.model);
        let grab = model.grab(grab);

        tracing::debug!(
            chain = %crate::engine::model::format_chain(grab.chain()),
            kind = grab.action().kind(),
            "grab fired"
        );

        match grab.action() {
            GrabAction::Symbolic(action) => self.perform(*action),
            GrabAction::Exec(command) => {
                if let Err(err) = self.window_system.spawn(command) {
                    tracing::warn!(error = %err, %command, "failed to spawn command");
                }
            }
            GrabAction::GravityCycle(gravities) => self.cycle_gravity(grab.id(), gravities),
            GrabAction::Callback(handle) => {
                let client = self.focus.and_then(|id| self.clients.get(&id));
                self.hooks.invoke(handle, CallbackContext { client, ..Default::default() });
            }
        }
    }

    /// Applies the next gravity of a cycle to the focused client.
    fn cycle_gravity(&mut self, grab: GrabId, gravities: &[GravityId]) {
        let Some(id) = self.focus else {
            tracing::debug!("gravity cycle without a focused client");
            return;
        };
        let Some(index) = self.cycles.advance(id, grab, gravities.len()) else { return };

        self.place_with_gravity(id, gravities[index]);
    }

    // ========================================================================
    // Built-in actions
    // ========================================================================

    /// Performs a built-in action.
    ///
    /// View, screen and flag actions change engine state first. Every action
    /// is then handed to the window system with the focused client.
    pub fn perform(&mut self, action: SymbolicAction) {
        match action {
            SymbolicAction::ViewJump(n) => self.show_view_at(usize::from(n).saturating_sub(1), true),
            SymbolicAction::ViewSwitch(n) => self.show_view_at(usize::from(n).saturating_sub(1), false),
            SymbolicAction::ViewNext => self.step_view(true),
            SymbolicAction::ViewPrev => self.step_view(false),
            SymbolicAction::ScreenJump(n) => self.focus_screen(usize::from(n).saturating_sub(1)),
            SymbolicAction::Reload => self.requests.push(Request::Reload),
            SymbolicAction::Restart => self.requests.push(Request::Restart),
            SymbolicAction::Quit => self.requests.push(Request::Quit),
            SymbolicAction::WindowFloat => self.toggle(Toggle::Floating),
            SymbolicAction::WindowFull => self.toggle(Toggle::Full),
            SymbolicAction::WindowStick => self.toggle(Toggle::Sticky),
            SymbolicAction::WindowSelect(direction) => self.select(direction),
            SymbolicAction::WindowMoveToScreen(n) => self.move_to_screen(usize::from(n).saturating_sub(1)),
            SymbolicAction::WindowMove
            | SymbolicAction::WindowResize
            | SymbolicAction::WindowRaise
            | SymbolicAction::WindowLower
            | SymbolicAction::WindowKill => {}
        }

        let client = self.focus.and_then(|id| self.clients.get(&id));
        self.window_system.perform(action, client);
    }

    // ========================================================================
    // Views and screens
    // ========================================================================

    /// Shows the view with `name` on the current screen, swapping with
    /// another screen that shows it.
    pub fn jump_to_view(&mut self, name: &str) -> bool {
        let Some(view) = self.model.view_by_name(name).map(crate::engine::model::View::id) else {
            tracing::warn!(view = name, "jump to unknown view");
            return false;
        };
        self.show_view(view, true);
        true
    }

    fn show_view_at(&mut self, index: usize, swap: bool) {
        match self.model.view_at(index).map(crate::engine::model::View::id) {
            Some(view) => self.show_view(view, swap),
            None => tracing::debug!(index = index + 1, "no view at index"),
        }
    }

    /// Shows `view` on the current screen.
    ///
    /// With `swap`, a screen already showing the view takes over the current
    /// screen's view. Gravity cursors reset; the `view_jump` and `tile`
    /// hooks fire.
    pub fn show_view(&mut self, view: ViewId, swap: bool) {
        let current = self.current_screen;
        let Some(previous) = self.screens.get(current).map(|screen| screen.active_view) else {
            return;
        };

        let mut touched = vec![current];
        if swap {
            if let Some(other) = self
                .screens
                .iter()
                .position(|screen| screen.id != current && screen.active_view == view)
            {
                self.screens[other].active_view = previous;
                touched.push(other);
            }
        }
        self.screens[current].active_view = view;

        self.cycles.clear();
        for screen in touched {
            self.retile_screen(screen);
        }

        let name = self.model.view(view).name();
        tracing::debug!(view = name, screen = current, "view jump");
        self.fire(HookEvent::ViewJump, CallbackContext { view: Some(name), ..Default::default() });
        self.fire(HookEvent::Tile, CallbackContext::default());
    }

    /// Moves to the next or previous view listed in panels, wrapping around.
    fn step_view(&mut self, forward: bool) {
        let views = self.visible_views();
        if views.is_empty() {
            return;
        }

        let active = self.screens.get(self.current_screen).map(|screen| screen.active_view);
        let next = match views.iter().position(|view| Some(*view) == active) {
            Some(position) if forward => (position + 1) % views.len(),
            Some(position) => (position + views.len() - 1) % views.len(),
            None => 0,
        };

        self.show_view(views[next], false);
    }

    fn focus_screen(&mut self, index: usize) {
        if index < self.screens.len() {
            self.current_screen = index;
        } else {
            tracing::debug!(screen = index + 1, "no such screen");
        }
    }

    fn move_to_screen(&mut self, index: usize) {
        let Some(id) = self.focus else { return };
        if index >= self.screens.len() {
            tracing::debug!(screen = index + 1, "no such screen");
            return;
        }

        if let Some(client) = self.clients.get_mut(&id) {
            client.screen = index;
        }
        self.place_on_view(id);
    }

    // ========================================================================
    // Focused client
    // ========================================================================

    fn toggle(&mut self, toggle: Toggle) {
        let Some(id) = self.focus else { return };
        let Some(client) = self.clients.get_mut(&id) else { return };

        let flag = match toggle {
            Toggle::Floating => &mut client.flags.floating,
            Toggle::Full => &mut client.flags.full,
            Toggle::Sticky => &mut client.flags.sticky,
        };
        *flag = !*flag;

        self.place_on_view(id);
    }

    /// Focuses the nearest client in `direction` on the current screen.
    fn select(&mut self, direction: Direction) {
        let Some(origin) = self.focused_client().and_then(|client| client.geometry) else {
            return;
        };
        let Some(view) = self.screens.get(self.current_screen).map(|screen| screen.active_view)
        else {
            return;
        };
        let (ox, oy) = center(origin);

        let target = self
            .clients
            .values()
            .filter(|client| {
                Some(client.id) != self.focus
                    && client.screen == self.current_screen
                    && client.is_visible_on(view)
            })
            .filter_map(|client| candidate(client, direction, ox, oy))
            .min_by_key(|(distance, id)| (*distance, *id))
            .map(|(_, id)| id);

        if let Some(id) = target {
            self.client_focused(id);
        }
    }
}

fn center(rect: crate::engine::state::Rect) -> (i64, i64) {
    (
        i64::from(rect.x) + i64::from(rect.width) / 2,
        i64::from(rect.y) + i64::from(rect.height) / 2,
    )
}

/// Returns the squared distance to a client lying in `direction`.
fn candidate(client: &Client, direction: Direction, ox: i64, oy: i64) -> Option<(i64, ClientId)> {
    let (cx, cy) = center(client.geometry?);
    let ahead = match direction {
        Direction::Left => cx < ox,
        Direction::Right => cx > ox,
        Direction::Up => cy < oy,
        Direction::Down => cy > oy,
    };

    ahead.then(|| ((cx - ox).pow(2) + (cy - oy).pow(2), client.id))
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::super::Request;
    use super::super::tests::{fixture, window};
    use crate::engine::chain::ChainState;
    use crate::engine::hooks::HookEvent;
    use crate::engine::model::{Chord, Direction, Modifiers, SymbolicAction};
    use crate::engine::state::{ClientId, Rect};
    use crate::engine::window_system::Effect;

    fn key(modifiers: Modifiers, name: &str) -> Chord { Chord::key(modifiers, name) }

    #[test]
    fn test_exec_grab_spawns() {
        let (mut runtime, recorder, _) = fixture();
        let fired = runtime.chord(&key(Modifiers::SUPER, "Return"), Instant::now());
        assert_eq!(fired.len(), 1);
        assert_eq!(recorder.spawned(), vec!["xterm".to_string()]);
    }

    #[test]
    fn test_ambiguous_chain_fires_on_timeout() {
        let (mut runtime, recorder, _) = fixture();
        let start = Instant::now();

        assert!(runtime.chord(&key(Modifiers::CONTROL, "y"), start).is_empty());
        assert_eq!(runtime.chain_state(), ChainState::Ambiguous);
        assert_eq!(runtime.keychain(), "C-y");
        assert!(runtime.chain_timeout(start + Duration::from_millis(10)).is_none());

        let deadline = runtime.chain_deadline().unwrap();
        assert!(runtime.chain_timeout(deadline).is_some());
        assert_eq!(recorder.spawned(), vec!["short".to_string()]);
        assert_eq!(runtime.chain_state(), ChainState::Idle);
    }

    #[test]
    fn test_chain_completes_before_timeout() {
        let (mut runtime, recorder, _) = fixture();
        let start = Instant::now();

        runtime.chord(&key(Modifiers::CONTROL, "y"), start);
        let fired = runtime.chord(&key(Modifiers::NONE, "Return"), start);
        assert_eq!(fired.len(), 1);
        assert_eq!(recorder.spawned(), vec!["long".to_string()]);
    }

    #[test]
    fn test_gravity_cycle_walks_and_wraps() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        let press = key(Modifiers::SUPER, "KP_7");
        let mut names = Vec::new();
        for _ in 0..4 {
            runtime.chord(&press, Instant::now());
            let gravity = runtime.client(id).unwrap().gravity.unwrap();
            names.push(runtime.model().gravity(gravity).name().to_string());
        }

        assert_eq!(names, ["top_left", "top_left66", "top_left33", "top_left"]);
        assert_eq!(runtime.client(id).unwrap().geometry, Some(Rect::new(0, 18, 960, 531)));
    }

    #[test]
    fn test_gravity_cycle_restarts_after_view_change() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        let press = key(Modifiers::SUPER, "KP_7");
        runtime.chord(&press, Instant::now());
        runtime.chord(&press, Instant::now());

        runtime.perform(SymbolicAction::ViewJump(2));
        runtime.perform(SymbolicAction::ViewJump(1));
        runtime.chord(&press, Instant::now());

        let gravity = runtime.client(id).unwrap().gravity.unwrap();
        assert_eq!(runtime.model().gravity(gravity).name(), "top_left");
    }

    #[test]
    fn test_gravity_cycle_restarts_when_configure_changes_tags() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "shell"), false);
        runtime.client_focused(id);

        let press = key(Modifiers::SUPER, "KP_7");
        runtime.chord(&press, Instant::now());
        runtime.chord(&press, Instant::now());

        runtime.client_configured(id, window(1, "xterm: shell"));
        // The picked gravity went with the old tags.
        assert_eq!(runtime.client(id).unwrap().geometry, Some(Rect::new(0, 18, 1920, 1062)));

        runtime.chord(&press, Instant::now());
        let gravity = runtime.client(id).unwrap().gravity.unwrap();
        assert_eq!(runtime.model().gravity(gravity).name(), "top_left");
    }

    #[test]
    fn test_picked_gravity_survives_view_roundtrip_and_toggles() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        runtime.chord(&key(Modifiers::SUPER, "KP_7"), Instant::now());
        let picked = Some(Rect::new(0, 18, 960, 531));
        assert_eq!(runtime.client(id).unwrap().geometry, picked);

        runtime.perform(SymbolicAction::ViewJump(2));
        runtime.perform(SymbolicAction::ViewJump(1));
        assert_eq!(runtime.client(id).unwrap().geometry, picked);

        runtime.perform(SymbolicAction::WindowFloat);
        let client = runtime.client(id).unwrap();
        assert_eq!(client.geometry, picked);
        assert_eq!(runtime.model().gravity(client.gravity.unwrap()).name(), "top_left");
    }

    #[test]
    fn test_sentinel_in_cycle_keeps_gravity_and_geometry() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        let press = key(Modifiers::SUPER, "KP_5");
        runtime.chord(&press, Instant::now());
        let left = Some(Rect::new(0, 18, 960, 1062));
        assert_eq!(runtime.client(id).unwrap().geometry, left);

        runtime.chord(&press, Instant::now());
        let client = runtime.client(id).unwrap();
        assert_eq!(client.geometry, left);
        assert_eq!(runtime.model().gravity(client.gravity.unwrap()).name(), "left");

        runtime.perform(SymbolicAction::ViewJump(2));
        runtime.perform(SymbolicAction::ViewJump(1));
        assert_eq!(runtime.client(id).unwrap().geometry, left);
    }

    #[test]
    fn test_callback_grab_receives_focused_client() {
        let (mut runtime, _, events) = fixture();
        let id = runtime.client_created(window(9, "xterm"), false);
        runtime.client_focused(id);
        events.lock().clear();

        runtime.chord(&key(Modifiers::SHIFT, "F2"), Instant::now());
        assert_eq!(events.lock().as_slice(), &[(None, Some(ClientId(9)))]);
    }

    #[test]
    fn test_view_jump_swaps_screens() {
        let (mut runtime, _, events) = fixture();
        runtime.set_screens(&[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)]);
        let model = runtime.model().clone();
        let terms = model.view_by_name("terms").unwrap().id();
        let www = model.view_by_name("www").unwrap().id();

        assert_eq!(runtime.screens()[0].active_view, terms);
        assert_eq!(runtime.screens()[1].active_view, www);

        events.lock().clear();
        assert!(runtime.jump_to_view("www"));
        assert_eq!(runtime.screens()[0].active_view, www);
        assert_eq!(runtime.screens()[1].active_view, terms);
        assert_eq!(events.lock().first().map(|(event, _)| *event), Some(Some(HookEvent::ViewJump)));

        assert!(!runtime.jump_to_view("nowhere"));
    }

    #[test]
    fn test_view_next_skips_hidden_dynamic_views() {
        let (mut runtime, _, _) = fixture();
        let model = runtime.model().clone();
        let name = |runtime: &super::Runtime| {
            model.view(runtime.screens()[0].active_view).name().to_string()
        };

        runtime.perform(SymbolicAction::ViewNext);
        assert_eq!(name(&runtime), "www");
        runtime.perform(SymbolicAction::ViewNext);
        assert_eq!(name(&runtime), "dev");
        runtime.perform(SymbolicAction::ViewNext);
        assert_eq!(name(&runtime), "terms");

        runtime.client_created(window(3, "gimp").with_role("gimp-image-window"), false);
        runtime.perform(SymbolicAction::ViewPrev);
        assert_eq!(name(&runtime), "dev");
        runtime.perform(SymbolicAction::ViewPrev);
        assert_eq!(name(&runtime), "gimp");
    }

    #[test]
    fn test_toggles_and_requests() {
        let (mut runtime, recorder, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);
        runtime.client_focused(id);

        runtime.perform(SymbolicAction::WindowFull);
        let client = runtime.client(id).unwrap();
        assert!(client.flags.full);
        assert_eq!(client.geometry, Some(Rect::new(0, 0, 1920, 1080)));

        runtime.perform(SymbolicAction::WindowStick);
        assert!(runtime.client(id).unwrap().flags.sticky);

        runtime.perform(SymbolicAction::Reload);
        runtime.perform(SymbolicAction::Quit);
        assert_eq!(runtime.take_requests(), vec![Request::Reload, Request::Quit]);
        assert!(runtime.take_requests().is_empty());

        runtime.perform(SymbolicAction::WindowKill);
        assert!(recorder.effects().contains(&Effect::Perform {
            action: SymbolicAction::WindowKill,
            client: Some(id),
        }));
    }

    #[test]
    fn test_window_select_moves_focus() {
        let (mut runtime, _, _) = fixture();
        let left = runtime.client_created(window(1, "xterm"), false);
        let right = runtime.client_created(window(2, "urxvt"), false);
        runtime.client_focused(left);

        runtime.perform(SymbolicAction::WindowSelect(Direction::Right));
        // Both cover the same area, so nothing lies to the right.
        assert_eq!(runtime.focus(), Some(left));

        runtime.client_focused(right);
        runtime.chord(&key(Modifiers::SUPER, "KP_6"), Instant::now());
        runtime.client_focused(left);
        runtime.chord(&key(Modifiers::SUPER, "KP_4"), Instant::now());

        runtime.perform(SymbolicAction::WindowSelect(Direction::Right));
        assert_eq!(runtime.focus(), Some(right));
    }

    #[test]
    fn test_move_to_screen() {
        let (mut runtime, _, _) = fixture();
        runtime.set_screens(&[Rect::new(0, 0, 1920, 1080), Rect::new(1920, 0, 1280, 1024)]);
        let id = runtime.client_created(window(1, "firefox"), false);
        runtime.client_focused(id);

        runtime.perform(SymbolicAction::WindowMoveToScreen(2));
        let client = runtime.client(id).unwrap();
        assert_eq!(client.screen, 1);
        // `left` on the second screen, which has no panel.
        assert_eq!(client.geometry, Some(Rect::new(1920, 0, 640, 1024)));

        runtime.perform(SymbolicAction::WindowMoveToScreen(5));
        assert_eq!(runtime.client(id).unwrap().screen, 1);
    }
}
