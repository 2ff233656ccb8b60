//! Tags: named rule sets that select windows and carry placement properties.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::pattern::{MatchRule, WindowAttributes};
use super::{GravityId, TagId};
use crate::engine::state::Rect;

/// EWMH window type a tag can force onto its clients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WindowType {
    #[default]
    Normal,
    Desktop,
    Dock,
    Toolbar,
    Splash,
    Dialog,
}

/// Properties a tag applies to the clients it matches.
///
/// Every field is optional so that later tags only override what they set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagProperties {
    pub float: Option<bool>,
    pub full: Option<bool>,
    pub stick: Option<bool>,
    pub urgent: Option<bool>,
    pub resize: Option<bool>,
    pub window_type: Option<WindowType>,
    pub gravity: Option<GravityId>,
    /// Pixel geometry on the screen. Forces floating.
    pub geometry: Option<Rect>,
}

/// A compiled tag.
#[derive(Debug, Clone)]
pub struct Tag {
    pub(crate) id: TagId,
    pub(crate) name: String,
    pub(crate) rules: Vec<MatchRule>,
    pub(crate) excludes: Vec<MatchRule>,
    pub(crate) properties: TagProperties,
}

impl Tag {
    /// Creates a tag without rules or properties.
    #[must_use]
    pub fn new(id: TagId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rules: Vec::new(),
            excludes: Vec::new(),
            properties: TagProperties::default(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> TagId { self.id }

    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    #[must_use]
    pub fn rules(&self) -> &[MatchRule] { &self.rules }

    #[must_use]
    pub fn excludes(&self) -> &[MatchRule] { &self.excludes }

    #[must_use]
    pub const fn properties(&self) -> &TagProperties { &self.properties }

    /// Checks whether the tag applies to a window.
    ///
    /// Any match rule is enough; any exclude rule rejects the window. A tag
    /// without match rules never applies automatically.
    #[must_use]
    pub fn matches(&self, window: &WindowAttributes) -> bool {
        self.rules.iter().any(|rule| rule.matches(window))
            && !self.excludes.iter().any(|rule| rule.matches(window))
    }
}
