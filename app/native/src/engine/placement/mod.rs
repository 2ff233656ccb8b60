//! Client placement: flags, window type, gravity and view membership.
//!
//! Placement combines a client's tag set (from the tag matcher or assigned
//! explicitly) with the properties of those tags:
//!
//! - Tags are folded in declaration order, so later tags override earlier
//!   ones for float, full, stick, urgent, resize and type
//! - Gravity and geometry are last-write-wins too, but each remembers the tag
//!   that set it: they only apply on views that show that tag
//! - A geometry forces floating mode
//! - Transient windows become urgent when the global `urgent` option is on,
//!   unless a tag explicitly sets `urgent` to false
//! - Clients are members of every view showing one of their tags, or of the
//!   default view when no view does; sticky clients show everywhere
//! - Dynamic views are hidden while no client is a member

use serde::Serialize;

use crate::engine::model::{ConfigModel, GravityId, TagId, ViewId, WindowAttributes, WindowType};
use crate::engine::rules::match_tags;
use crate::engine::state::{Client, ClientFlags, Rect, TagSet, ViewSet};

/// A value together with the tag that set it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Scoped<T> {
    pub value: T,
    pub tag: TagId,
}

/// Derived placement of a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub tags: TagSet,
    pub views: ViewSet,
    pub flags: ClientFlags,
    pub window_type: WindowType,
    pub gravity: Option<Scoped<GravityId>>,
    pub geometry: Option<Scoped<Rect>>,
}

impl Placement {
    /// Returns the tag gravity that applies on `view`.
    ///
    /// Walks the tags from last to first and takes the first tag with a
    /// gravity that `view` shows.
    #[must_use]
    pub fn gravity_on(&self, model: &ConfigModel, view: ViewId) -> Option<GravityId> {
        tag_gravity_on(model, &self.tags, view)
    }

    /// Returns the tag geometry that applies on `view`.
    #[must_use]
    pub fn geometry_on(&self, model: &ConfigModel, view: ViewId) -> Option<Rect> {
        tag_geometry_on(model, &self.tags, view)
    }

    /// Whether the client shows on `view`.
    #[must_use]
    pub fn is_visible_on(&self, view: ViewId) -> bool {
        self.flags.sticky || self.views.contains(&view)
    }
}

/// Returns the gravity of the last tag in `tags` that carries one and that
/// `view` shows.
#[must_use]
pub fn tag_gravity_on(model: &ConfigModel, tags: &[TagId], view: ViewId) -> Option<GravityId> {
    scoped_on(model, tags, view, |tag| model.tag(tag).properties().gravity)
}

/// Returns the geometry override of the last tag in `tags` that carries one
/// and that `view` shows.
#[must_use]
pub fn tag_geometry_on(model: &ConfigModel, tags: &[TagId], view: ViewId) -> Option<Rect> {
    scoped_on(model, tags, view, |tag| model.tag(tag).properties().geometry)
}

fn scoped_on<T>(
    model: &ConfigModel,
    tags: &[TagId],
    view: ViewId,
    property: impl Fn(TagId) -> Option<T>,
) -> Option<T> {
    let view = model.view(view);
    tags.iter().rev().filter(|tag| view.includes(**tag)).find_map(|tag| property(*tag))
}

/// Matches a window and derives its placement.
#[must_use]
pub fn place(model: &ConfigModel, window: &WindowAttributes, transient: bool) -> Placement {
    let tags = match_tags(model, window);
    place_with_tags(model, tags, transient)
}

/// Derives placement from an explicit tag set.
#[must_use]
pub fn place_with_tags(model: &ConfigModel, tags: TagSet, transient: bool) -> Placement {
    let options = model.options();
    let mut flags = ClientFlags { resize: options.resize, ..ClientFlags::default() };
    let mut urgent: Option<bool> = None;
    let mut window_type = WindowType::Normal;
    let mut gravity = None;
    let mut geometry = None;

    for tag_id in &tags {
        let props = model.tag(*tag_id).properties();

        if let Some(float) = props.float {
            flags.floating = float;
        }
        if let Some(full) = props.full {
            flags.full = full;
        }
        if let Some(stick) = props.stick {
            flags.sticky = stick;
        }
        if let Some(resize) = props.resize {
            flags.resize = resize;
        }
        if let Some(kind) = props.window_type {
            window_type = kind;
        }
        if props.urgent.is_some() {
            urgent = props.urgent;
        }
        if let Some(value) = props.gravity {
            gravity = Some(Scoped { value, tag: *tag_id });
        }
        if let Some(value) = props.geometry {
            geometry = Some(Scoped { value, tag: *tag_id });
        }
    }

    if geometry.is_some() {
        flags.floating = true;
    }

    flags.urgent = urgent.unwrap_or(transient && options.urgent);

    let views = view_membership(model, &tags);

    Placement { tags, views, flags, window_type, gravity, geometry }
}

/// Returns the views showing any of `tags`, or the default view.
#[must_use]
pub fn view_membership(model: &ConfigModel, tags: &[TagId]) -> ViewSet {
    let views: ViewSet =
        model.views().iter().filter(|view| view.includes_any(tags)).map(|view| view.id()).collect();

    if views.is_empty() {
        let mut fallback = ViewSet::new();
        fallback.push(model.default_view());
        return fallback;
    }

    views
}

/// Returns the views that should be listed in panels.
///
/// Static views are always listed; dynamic views only while at least one
/// client is a member by tag. Sticky clients do not keep dynamic views alive.
#[must_use]
pub fn visible_views<'a>(
    model: &ConfigModel,
    clients: impl IntoIterator<Item = &'a Client> + Clone,
) -> Vec<ViewId> {
    model
        .views()
        .iter()
        .filter(|view| {
            !view.is_dynamic()
                || clients.clone().into_iter().any(|client| client.views.contains(&view.id()))
        })
        .map(|view| view.id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_model;
    use crate::engine::state::ClientId;

    fn model() -> ConfigModel {
        build_model(
            r#"{
                "tags": [
                    { "name": "terms", "match": "xterm" },
                    { "name": "browser", "match": "firefox" },
                    { "name": "editor", "match": "[g]?vim", "resize": true },
                    { "name": "fixed", "match": "mplayer", "geometry": [10, 10, 100, 100], "stick": true },
                    { "name": "float", "match": "display|mplayer", "float": false },
                    { "name": "gimp_image", "match": [{ "role": "gimp-image-window" }], "gravity": "gimp_image" },
                    { "name": "calm", "match": "dialog", "urgent": false },
                    { "name": "dialogs", "match": "dialog|popup", "type": "dialog" },
                    { "name": "wide", "match": "firefox", "gravity": "top" }
                ],
                "views": [
                    { "name": "terms", "match": "terms|default" },
                    { "name": "www", "match": "browser" },
                    { "name": "gimp", "match": "gimp_.*", "dynamic": true },
                    { "name": "dev", "match": "editor|terms" },
                    { "name": "wide", "match": "wide" }
                ],
                "options": { "urgent": true, "defaultTag": "default" }
            }"#,
        )
    }

    fn view_names(model: &ConfigModel, views: &[ViewId]) -> Vec<String> {
        views.iter().map(|id| model.view(*id).name().to_string()).collect()
    }

    fn client(model: &ConfigModel, id: u64, window: &WindowAttributes) -> Client {
        let placement = place(model, window, false);
        Client {
            id: ClientId(id),
            attributes: window.clone(),
            transient: false,
            tags: placement.tags,
            views: placement.views,
            flags: placement.flags,
            window_type: placement.window_type,
            gravity: None,
            screen: 0,
            geometry: None,
        }
    }

    #[test]
    fn test_view_membership_follows_tags() {
        let model = model();
        let placement = place(&model, &WindowAttributes::new(1, "xterm"), false);
        assert_eq!(view_names(&model, &placement.views), vec!["terms", "dev"]);
    }

    #[test]
    fn test_unmatched_client_lands_on_default_view() {
        let model = model();
        let placement = place(&model, &WindowAttributes::new(1, "unknown"), false);
        assert_eq!(placement.tags.as_slice(), &[model.default_tag()]);
        assert_eq!(view_names(&model, &placement.views), vec!["terms"]);
    }

    #[test]
    fn test_later_tags_override_earlier_flags() {
        let model = model();
        // "fixed" forces floating via geometry, "float" then sets float=false,
        // but geometry still forces floating at the end
        let placement = place(&model, &WindowAttributes::new(1, "mplayer"), false);
        assert!(placement.flags.floating);
        assert!(placement.flags.sticky);
        assert!(placement.geometry.is_some());

        let placement = place(&model, &WindowAttributes::new(2, "display"), false);
        assert!(!placement.flags.floating);
    }

    #[test]
    fn test_resize_defaults_to_global_option() {
        let model = model();
        assert!(!place(&model, &WindowAttributes::new(1, "xterm"), false).flags.resize);
        assert!(place(&model, &WindowAttributes::new(2, "gvim"), false).flags.resize);
    }

    #[test]
    fn test_transient_urgency() {
        let model = model();
        assert!(place(&model, &WindowAttributes::new(1, "xterm"), true).flags.urgent);
        assert!(!place(&model, &WindowAttributes::new(1, "xterm"), false).flags.urgent);
        // A tag that sets urgent=false wins over the global option
        assert!(!place(&model, &WindowAttributes::new(2, "dialog"), true).flags.urgent);
        // "dialogs" comes later without urgent and keeps the explicit false
        let placement = place(&model, &WindowAttributes::new(3, "dialog"), true);
        assert_eq!(placement.window_type, WindowType::Dialog);
        assert!(!placement.flags.urgent);
    }

    #[test]
    fn test_gravity_is_scoped_to_views_showing_the_tag() {
        let model = model();
        let placement = place(&model, &WindowAttributes::new(1, "firefox"), false);
        let www = model.view_by_name("www").unwrap().id();
        let wide = model.view_by_name("wide").unwrap().id();

        // "wide" sets gravity top, but the www view only shows "browser"
        assert_eq!(placement.gravity_on(&model, www), None);
        assert_eq!(
            placement.gravity_on(&model, wide),
            Some(model.gravity_by_name("top").unwrap().id())
        );
        assert_eq!(placement.gravity.map(|g| g.tag), model.tag_by_name("wide").map(|t| t.id()));
    }

    #[test]
    fn test_geometry_is_scoped_to_views_showing_the_tag() {
        let model = model();
        let placement = place(&model, &WindowAttributes::new(1, "mplayer"), false);
        let terms = model.view_by_name("terms").unwrap().id();
        assert_eq!(placement.geometry_on(&model, terms), None);
        assert_eq!(placement.geometry.map(|g| g.value), Some(Rect::new(10, 10, 100, 100)));
    }

    #[test]
    fn test_sticky_client_is_visible_everywhere() {
        let model = model();
        let placement = place(&model, &WindowAttributes::new(1, "mplayer"), false);
        for view in model.views() {
            assert!(placement.is_visible_on(view.id()));
        }
    }

    #[test]
    fn test_dynamic_view_visibility() {
        let model = model();
        let xterm = client(&model, 1, &WindowAttributes::new(1, "xterm"));
        let mut clients = vec![xterm];

        let visible = visible_views(&model, &clients);
        assert_eq!(view_names(&model, &visible), vec!["terms", "www", "dev", "wide"]);

        clients.push(client(&model, 2, &WindowAttributes::new(2, "GIMP").with_role("gimp-image-window")));
        let visible = visible_views(&model, &clients);
        assert_eq!(view_names(&model, &visible), vec!["terms", "www", "gimp", "dev", "wide"]);
    }

    #[test]
    fn test_sticky_clients_do_not_keep_dynamic_views_alive() {
        let model = model();
        let clients = vec![client(&model, 1, &WindowAttributes::new(1, "mplayer"))];
        let visible = visible_views(&model, &clients);
        assert!(!view_names(&model, &visible).contains(&"gimp".to_string()));
    }
}
