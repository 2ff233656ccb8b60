//! Client lifecycle: creation, reconfiguration, focus, retagging, removal
//! and geometry.

use super::Runtime;
use crate::engine::gravity::apply_gravity;
use crate::engine::hooks::{CallbackContext, HookEvent};
use crate::engine::model::{GravityId, WindowAttributes};
use crate::engine::placement::{Placement, place, place_with_tags, tag_geometry_on, tag_gravity_on};
use crate::engine::rules::resolve_tag_names;
use crate::engine::state::{Client, ClientId, Rect};

impl Runtime {
    /// Manages a new window.
    ///
    /// The window is matched against the tags, placed on the current screen
    /// and configured; then the `client_create` hook fires. A window that is
    /// already managed is treated as a reconfiguration.
    pub fn client_created(&mut self, attributes: WindowAttributes, transient: bool) -> ClientId {
        let id = ClientId(attributes.id);
        if self.clients.contains_key(&id) {
            tracing::debug!(client = %id, "client already managed, reconfiguring");
            self.client_configured(id, attributes);
            return id;
        }

        let placement = place(&self.model, &attributes, transient);
        let client = Client {
            id,
            attributes,
            transient,
            tags: placement.tags.clone(),
            views: placement.views.clone(),
            flags: placement.flags,
            window_type: placement.window_type,
            gravity: None,
            screen: self.current_screen,
            geometry: None,
        };

        tracing::debug!(
            client = %id,
            name = %client.attributes.name,
            tags = client.tags.len(),
            "client created"
        );
        self.clients.insert(id, client);
        self.adopt(id, placement);
        self.fire_for_client(HookEvent::ClientCreate, id);

        id
    }

    /// Updates a client's attributes and places it again.
    ///
    /// Clients with explicitly assigned tags keep them. Returns `false` for
    /// unknown clients.
    pub fn client_configured(&mut self, id: ClientId, attributes: WindowAttributes) -> bool {
        let Some(client) = self.clients.get_mut(&id) else {
            tracing::debug!(client = %id, "configure for unknown client");
            return false;
        };

        let changed = client.attributes != attributes;
        client.attributes = attributes;

        if changed {
            self.replace_client(id);
        }
        self.fire_for_client(HookEvent::ClientConfigure, id);
        true
    }

    /// Moves focus to a client and makes its screen current.
    pub fn client_focused(&mut self, id: ClientId) -> bool {
        let Some(client) = self.clients.get(&id) else {
            tracing::debug!(client = %id, "focus for unknown client");
            return false;
        };

        self.current_screen = client.screen;
        self.focus = Some(id);
        self.fire_for_client(HookEvent::ClientFocus, id);
        true
    }

    /// Forgets a client.
    ///
    /// Returns the removed client, after the `client_kill` hook has seen it.
    pub fn client_killed(&mut self, id: ClientId) -> Option<Client> {
        if !self.clients.contains_key(&id) {
            tracing::debug!(client = %id, "kill for unknown client");
            return None;
        }

        self.fire_for_client(HookEvent::ClientKill, id);

        self.explicit_tags.remove(&id);
        self.picked_gravity.remove(&id);
        self.cycles.reset_client(id);
        if self.focus == Some(id) {
            self.focus = None;
        }

        tracing::debug!(client = %id, "client killed");
        self.clients.remove(&id)
    }

    /// Replaces a client's tags by name and places it again.
    ///
    /// Unknown names are skipped; an empty result falls back to the default
    /// tag. The assignment survives reloads. Fires the `tile` hook.
    pub fn retag<S: AsRef<str>>(&mut self, id: ClientId, names: &[S]) -> bool {
        if !self.clients.contains_key(&id) {
            tracing::debug!(client = %id, "retag for unknown client");
            return false;
        }

        let names: Vec<String> = names.iter().map(|name| name.as_ref().to_string()).collect();
        self.explicit_tags.insert(id, names);
        self.picked_gravity.remove(&id);
        self.cycles.reset_client(id);
        self.replace_client(id);
        self.fire(HookEvent::Tile, CallbackContext::default());
        true
    }

    // ========================================================================
    // Placement and geometry
    // ========================================================================

    /// Recomputes a client's placement from its attributes or assigned tags.
    pub(super) fn replace_client(&mut self, id: ClientId) {
        let Some(client) = self.clients.get(&id) else { return };

        let placement = match self.explicit_tags.get(&id) {
            Some(names) => {
                let tags = resolve_tag_names(&self.model, names);
                place_with_tags(&self.model, tags, client.transient)
            }
            None => place(&self.model, &client.attributes, client.transient),
        };

        self.adopt(id, placement);
    }

    /// Stores a placement on a client and positions it.
    ///
    /// A change of tags or views drops the client's gravity cursors and its
    /// picked gravity.
    fn adopt(&mut self, id: ClientId, placement: Placement) {
        let Some(client) = self.clients.get_mut(&id) else { return };

        let moved = !same_members(&client.tags, &placement.tags)
            || !same_members(&client.views, &placement.views);
        client.tags = placement.tags;
        client.views = placement.views;
        client.flags = placement.flags;
        client.window_type = placement.window_type;

        if moved {
            self.cycles.reset_client(id);
            self.picked_gravity.remove(&id);
        }
        self.place_on_view(id);
    }

    /// Positions a client for the view it is shown on.
    ///
    /// That is the active view of its screen when the client is visible
    /// there, otherwise its first view. Full-screen clients cover the
    /// screen. Otherwise a gravity picked with a cycle grab wins, then a tag
    /// geometry shown by the view, then the tag gravity shown by the view,
    /// then the default gravity.
    pub(super) fn place_on_view(&mut self, id: ClientId) {
        let Some(client) = self.clients.get(&id) else { return };
        let screen = self.screen(client.screen);
        let view = if client.is_visible_on(screen.active_view) {
            screen.active_view
        } else {
            client.views.first().copied().unwrap_or(screen.active_view)
        };
        let model = &self.model;
        let picked = self.picked_gravity.get(&id).copied();

        let gravity = picked
            .or_else(|| tag_gravity_on(model, &client.tags, view))
            .or(model.options().default_gravity);

        let tag_geometry =
            if picked.is_some() { None } else { tag_geometry_on(model, &client.tags, view) };

        let geometry = if client.flags.full {
            screen.geometry
        } else if let Some(rect) = tag_geometry {
            rect
        } else {
            apply_gravity(
                gravity.map(|id| model.gravity(id)),
                screen.area,
                client.geometry,
                model.default_gravity(),
            )
        };

        let gravity = self.effective_gravity(client, gravity);
        self.commit(id, gravity, geometry);
    }

    /// Positions a client with a gravity picked by a cycle grab.
    ///
    /// The sentinel keeps the client's geometry and its current gravity.
    pub(super) fn place_with_gravity(&mut self, id: ClientId, gravity: GravityId) {
        let Some(client) = self.clients.get(&id) else { return };
        let screen = self.screen(client.screen);
        let model = &self.model;

        let geometry = if client.flags.full {
            screen.geometry
        } else {
            apply_gravity(
                Some(model.gravity(gravity)),
                screen.area,
                client.geometry,
                model.default_gravity(),
            )
        };

        let gravity = self.effective_gravity(client, Some(gravity));
        if let Some(gravity) = gravity {
            self.picked_gravity.insert(id, gravity);
        }
        self.commit(id, gravity, geometry);
    }

    /// Replaces the sentinel with the client's current gravity.
    fn effective_gravity(&self, client: &Client, gravity: Option<GravityId>) -> Option<GravityId> {
        match gravity {
            Some(id) if self.model.gravity(id).is_sentinel() => client.gravity,
            other => other,
        }
    }

    fn commit(&mut self, id: ClientId, gravity: Option<GravityId>, geometry: Rect) {
        if let Some(client) = self.clients.get_mut(&id) {
            client.gravity = gravity;
            client.geometry = Some(geometry);
            self.window_system.configure(client);
        }
    }

    /// Positions every client shown by the active view of `screen`.
    pub(super) fn retile_screen(&mut self, screen: usize) {
        let Some(view) = self.screens.get(screen).map(|s| s.active_view) else { return };

        let ids: Vec<ClientId> = self
            .clients
            .values()
            .filter(|client| client.screen == screen && client.is_visible_on(view))
            .map(|client| client.id)
            .collect();

        for id in ids {
            self.place_on_view(id);
        }
    }

    /// Positions every client and fires the `tile` hook.
    pub(super) fn retile_all(&mut self) {
        for screen in 0..self.screens.len() {
            self.retile_screen(screen);
        }
        self.fire(HookEvent::Tile, CallbackContext::default());
    }
}

/// Compares two id lists as sets.
fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().all(|item| b.contains(item))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{fixture, window};
    use crate::engine::hooks::HookEvent;
    use crate::engine::state::{ClientId, Rect};
    use crate::engine::window_system::Effect;

    #[test]
    fn test_created_client_is_tagged_and_configured() {
        let (mut runtime, recorder, _) = fixture();
        let id = runtime.client_created(window(1, "xterm"), false);

        let client = runtime.client(id).unwrap();
        let model = runtime.model();
        assert_eq!(model.tag(client.tags[0]).name(), "terms");
        assert_eq!(client.views.len(), 1);
        assert_eq!(model.view(client.views[0]).name(), "terms");
        // Default gravity `center` covers the area below the 18px top panel.
        assert_eq!(client.geometry, Some(Rect::new(0, 18, 1920, 1062)));

        assert!(matches!(
            recorder.effects().last(),
            Some(Effect::Configure { client, .. }) if *client == id
        ));
    }

    #[test]
    fn test_unmatched_client_gets_default_tag_and_view() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(2, "unknown-app"), false);

        let client = runtime.client(id).unwrap();
        let model = runtime.model();
        assert_eq!(client.tags.as_slice(), &[model.default_tag()]);
        assert_eq!(client.views.as_slice(), &[model.default_view()]);
    }

    #[test]
    fn test_tag_geometry_applies_only_on_views_with_the_tag() {
        let (mut runtime, _, _) = fixture();
        // `fixed` carries a geometry and is shown by the `terms` view only.
        let id = runtime.client_created(window(3, "xterm fixed"), false);
        let client = runtime.client(id).unwrap();
        assert!(client.flags.floating);
        assert_eq!(client.geometry, Some(Rect::new(10, 10, 100, 100)));
    }

    #[test]
    fn test_tag_gravity_is_used() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(4, "firefox"), false);
        let client = runtime.client(id).unwrap();
        let model = runtime.model();
        assert_eq!(model.gravity(client.gravity.unwrap()).name(), "left");
        assert_eq!(client.geometry, Some(Rect::new(0, 18, 960, 1062)));
    }

    #[test]
    fn test_hooks_fire_for_lifecycle() {
        let (mut runtime, _, events) = fixture();
        let id = runtime.client_created(window(5, "xterm"), false);
        runtime.client_focused(id);
        runtime.client_killed(id);

        assert_eq!(
            events.lock().as_slice(),
            &[
                (Some(HookEvent::ClientCreate), Some(ClientId(5))),
                (Some(HookEvent::ClientFocus), Some(ClientId(5))),
                (Some(HookEvent::ClientKill), Some(ClientId(5))),
            ]
        );
        assert!(runtime.client(id).is_none());
        assert_eq!(runtime.focus(), None);
    }

    #[test]
    fn test_configure_with_new_title_replaces() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(6, "shell"), false);
        assert_eq!(runtime.client(id).unwrap().tags.as_slice(), &[runtime.model().default_tag()]);

        assert!(runtime.client_configured(id, window(6, "xterm: shell")));
        let model = runtime.model();
        assert_eq!(model.tag(runtime.client(id).unwrap().tags[0]).name(), "terms");
        assert!(!runtime.client_configured(ClientId(99), window(99, "x")));
    }

    #[test]
    fn test_retag_survives_reconfigure() {
        let (mut runtime, _, _) = fixture();
        let id = runtime.client_created(window(7, "xterm"), false);

        assert!(runtime.retag(id, &["browser", "nonexistent"]));
        let model = runtime.model().clone();
        let client = runtime.client(id).unwrap();
        assert_eq!(client.tags.len(), 1);
        assert_eq!(model.tag(client.tags[0]).name(), "browser");
        assert_eq!(model.view(client.views[0]).name(), "www");

        runtime.client_configured(id, window(7, "xterm again"));
        let client = runtime.client(id).unwrap();
        assert_eq!(model.tag(client.tags[0]).name(), "browser");
    }

    #[test]
    fn test_duplicate_create_is_a_configure() {
        let (mut runtime, _, events) = fixture();
        runtime.client_created(window(8, "xterm"), false);
        runtime.client_created(window(8, "xterm"), false);

        assert_eq!(runtime.clients().count(), 1);
        assert_eq!(
            events.lock().last().map(|(event, _)| *event),
            Some(Some(HookEvent::ClientConfigure))
        );
    }
}
