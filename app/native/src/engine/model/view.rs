//! Views: virtual desktops showing every client that shares one of their tags.

use regex::Regex;

use super::{TagId, ViewId};

/// A compiled view.
#[derive(Debug, Clone)]
pub struct View {
    pub(crate) id: ViewId,
    pub(crate) name: String,
    pub(crate) pattern: Regex,
    /// Tags matched by `pattern`, sorted by declaration order.
    pub(crate) tags: Vec<TagId>,
    pub(crate) dynamic: bool,
    pub(crate) icon: Option<String>,
    pub(crate) icon_only: bool,
}

impl View {
    #[must_use]
    pub const fn id(&self) -> ViewId { self.id }

    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Returns the source of the tag name pattern.
    #[must_use]
    pub fn pattern(&self) -> &str { self.pattern.as_str() }

    /// Returns the tags this view shows, in declaration order.
    #[must_use]
    pub fn tags(&self) -> &[TagId] { &self.tags }

    /// Whether the view hides itself while no client is visible on it.
    #[must_use]
    pub const fn is_dynamic(&self) -> bool { self.dynamic }

    #[must_use]
    pub fn icon(&self) -> Option<&str> { self.icon.as_deref() }

    #[must_use]
    pub const fn is_icon_only(&self) -> bool { self.icon_only }

    /// Checks whether a tag name is selected by this view's pattern.
    #[must_use]
    pub fn matches_tag_name(&self, tag: &str) -> bool { self.pattern.is_match(tag) }

    /// Checks whether the view shows clients carrying `tag`.
    #[must_use]
    pub fn includes(&self, tag: TagId) -> bool { self.tags.binary_search(&tag).is_ok() }

    /// Checks whether the view shows clients carrying any of `tags`.
    #[must_use]
    pub fn includes_any(&self, tags: &[TagId]) -> bool { tags.iter().any(|tag| self.includes(*tag)) }
}
