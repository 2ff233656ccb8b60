//! The immutable configuration model.
//!
//! A [`ConfigModel`] is compiled once per load or reload and then shared
//! read-only (behind an `Arc`) by every engine component. A reload never
//! mutates a model in place; it builds a new one and swaps it in between
//! event dispatches.
//!
//! Tags, views, gravities and grabs are addressed by small index newtypes
//! ([`TagId`], [`ViewId`], [`GravityId`], [`GrabId`]) that are only
//! meaningful for the model that produced them.

pub mod grab;
pub mod gravity;
pub mod options;
pub mod panel;
pub mod pattern;
pub mod tag;
pub mod view;

use std::collections::HashMap;

pub use grab::{
    Chain, ChainParseError, Chord, ChordInput, Direction, Grab, GrabAction, Modifiers,
    SymbolicAction, UnknownActionError, format_chain, parse_chain,
};
pub use gravity::Gravity;
pub use options::{DefaultsProfile, Options, Padding};
pub use panel::{PanelEntry, PanelItem, ScreenPanels, Sublet, UnknownPanelItem};
pub use pattern::{AttributeKind, MatchRule, Pattern, PatternKind, WindowAttributes};
use serde::Serialize;
pub use tag::{Tag, TagProperties, WindowType};
pub use view::View;

use crate::engine::chain::ChainTrie;
use crate::engine::hooks::HookTable;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub(crate) usize);

        impl $name {
            /// Returns the position in declaration order.
            #[must_use]
            pub const fn index(self) -> usize { self.0 }
        }
    };
}

define_id!(
    /// Index of a [`Tag`] in its model.
    TagId
);
define_id!(
    /// Index of a [`View`] in its model.
    ViewId
);
define_id!(
    /// Index of a [`Gravity`] in its model.
    GravityId
);
define_id!(
    /// Index of a [`Grab`] in its model.
    GrabId
);

/// Compiled, validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigModel {
    pub(crate) tags: Vec<Tag>,
    pub(crate) views: Vec<View>,
    pub(crate) gravities: Vec<Gravity>,
    pub(crate) gravity_names: HashMap<String, GravityId>,
    pub(crate) grabs: Vec<Grab>,
    pub(crate) chains: ChainTrie,
    pub(crate) screens: Vec<ScreenPanels>,
    pub(crate) sublets: Vec<Sublet>,
    pub(crate) styles: serde_json::Map<String, serde_json::Value>,
    pub(crate) hooks: HookTable,
    pub(crate) options: Options,
    pub(crate) default_tag: TagId,
    pub(crate) default_view: ViewId,
}

impl ConfigModel {
    // ========================================================================
    // Tags
    // ========================================================================

    /// Returns all tags in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[Tag] { &self.tags }

    /// Returns a tag by id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to another model.
    #[must_use]
    pub fn tag(&self, id: TagId) -> &Tag { &self.tags[id.0] }

    /// Looks up a tag by name.
    #[must_use]
    pub fn tag_by_name(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|tag| tag.name == name)
    }

    /// The tag given to clients no tag matches.
    #[must_use]
    pub const fn default_tag(&self) -> TagId { self.default_tag }

    // ========================================================================
    // Views
    // ========================================================================

    /// Returns all views in declaration order.
    #[must_use]
    pub fn views(&self) -> &[View] { &self.views }

    /// Returns a view by id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to another model.
    #[must_use]
    pub fn view(&self, id: ViewId) -> &View { &self.views[id.0] }

    /// Looks up a view by name.
    #[must_use]
    pub fn view_by_name(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|view| view.name == name)
    }

    /// Returns the view at a 0-based position, if any.
    #[must_use]
    pub fn view_at(&self, index: usize) -> Option<&View> { self.views.get(index) }

    /// The view for clients no view shows.
    #[must_use]
    pub const fn default_view(&self) -> ViewId { self.default_view }

    // ========================================================================
    // Gravities
    // ========================================================================

    /// Returns all gravities in declaration order.
    #[must_use]
    pub fn gravities(&self) -> &[Gravity] { &self.gravities }

    /// Returns a gravity by id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to another model.
    #[must_use]
    pub fn gravity(&self, id: GravityId) -> &Gravity { &self.gravities[id.0] }

    /// Looks up a gravity by name.
    #[must_use]
    pub fn gravity_by_name(&self, name: &str) -> Option<&Gravity> {
        self.gravity_names.get(name).map(|id| self.gravity(*id))
    }

    /// The configured default gravity, if it resolved.
    #[must_use]
    pub fn default_gravity(&self) -> Option<&Gravity> {
        self.options.default_gravity.map(|id| self.gravity(id))
    }

    // ========================================================================
    // Grabs
    // ========================================================================

    /// Returns all grabs in declaration order.
    #[must_use]
    pub fn grabs(&self) -> &[Grab] { &self.grabs }

    /// Returns a grab by id.
    ///
    /// # Panics
    ///
    /// Panics if the id belongs to another model.
    #[must_use]
    pub fn grab(&self, id: GrabId) -> &Grab { &self.grabs[id.0] }

    /// Returns the chord prefix tree built from the grabs.
    #[must_use]
    pub const fn chains(&self) -> &ChainTrie { &self.chains }

    // ========================================================================
    // Panels, sublets, styles, hooks, options
    // ========================================================================

    /// Returns the panels of a 0-based screen. Unconfigured screens have none.
    #[must_use]
    pub fn screen_panels(&self, screen: usize) -> Option<&ScreenPanels> { self.screens.get(screen) }

    /// Returns the number of screens with panel declarations.
    #[must_use]
    pub fn configured_screens(&self) -> usize { self.screens.len() }

    #[must_use]
    pub fn sublets(&self) -> &[Sublet] { &self.sublets }

    /// Returns the opaque style blocks, keyed by style name.
    #[must_use]
    pub const fn styles(&self) -> &serde_json::Map<String, serde_json::Value> { &self.styles }

    #[must_use]
    pub const fn hooks(&self) -> &HookTable { &self.hooks }

    #[must_use]
    pub const fn options(&self) -> &Options { &self.options }
}
