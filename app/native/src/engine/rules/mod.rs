//! Tag matching for windows.
//!
//! This module resolves which tags apply to a window, given its attributes and
//! the tags of a [`ConfigModel`].
//!
//! # Rule Matching
//!
//! - A tag applies when **any** of its match rules matches (OR logic)
//! - A tag is rejected when **any** of its exclude rules matches, even if a
//!   match rule fired
//! - Tags are tested and returned in declaration order
//! - A window no tag applies to receives the model's default tag only
//!
//! Matching is a pure function of the attributes and the model, so repeated
//! calls always produce the same tag set.

use crate::engine::model::{ConfigModel, TagId, WindowAttributes};
use crate::engine::state::TagSet;

/// Returns the tags that apply to a window, falling back to the default tag.
#[must_use]
pub fn match_tags(model: &ConfigModel, window: &WindowAttributes) -> TagSet {
    let tags = matching_tags(model, window);

    if tags.is_empty() {
        let mut fallback = TagSet::new();
        fallback.push(model.default_tag());
        return fallback;
    }

    tags
}

/// Returns the tags whose rules apply to a window, without the default fallback.
#[must_use]
pub fn matching_tags(model: &ConfigModel, window: &WindowAttributes) -> TagSet {
    model.tags().iter().filter(|tag| tag.matches(window)).map(|tag| tag.id()).collect()
}

/// Resolves tag names to ids, keeping declaration order and dropping unknown names.
///
/// Used when tags are assigned explicitly instead of by matching. Unknown
/// names are logged and skipped; an empty result falls back to the default tag.
#[must_use]
pub fn resolve_tag_names<S: AsRef<str>>(model: &ConfigModel, names: &[S]) -> TagSet {
    let mut ids: Vec<TagId> = names
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            let tag = model.tag_by_name(name);
            if tag.is_none() {
                tracing::warn!(tag = name, "ignoring unknown tag");
            }
            tag.map(crate::engine::model::Tag::id)
        })
        .collect();

    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        ids.push(model.default_tag());
    }

    ids.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_model;

    fn model() -> ConfigModel {
        build_model(
            r#"{
                "tags": [
                    { "name": "terms", "match": "xterm|[u]?rxvt" },
                    { "name": "browser", "match": "firefox|navigator" },
                    {
                        "name": "editor",
                        "match": [{ "instance": "gvim" }, { "class": "Emacs" }],
                        "exclude": [{ "name": "scratch" }]
                    },
                    { "name": "gimp", "match": [{ "role": "gimp-", "plain": true }] },
                    { "name": "pinned", "match": [{ "id": 4194305 }] },
                    { "name": "console", "match": "term" }
                ],
                "views": [{ "name": "terms", "match": "terms|default" }],
                "options": { "defaultTag": "default" }
            }"#,
        )
    }

    fn names(model: &ConfigModel, tags: &TagSet) -> Vec<String> {
        tags.iter().map(|id| model.tag(*id).name().to_string()).collect()
    }

    #[test]
    fn test_matches_by_default_attributes() {
        let model = model();
        let window = WindowAttributes::new(1, "Mozilla Firefox").with_class("Navigator");
        assert_eq!(names(&model, &match_tags(&model, &window)), vec!["browser"]);
    }

    #[test]
    fn test_result_follows_declaration_order() {
        let model = model();
        let window = WindowAttributes::new(1, "terminal").with_class("URxvt");
        assert_eq!(names(&model, &match_tags(&model, &window)), vec!["terms", "console"]);
    }

    #[test]
    fn test_exclude_overrides_match() {
        let model = model();
        let editor = WindowAttributes::new(1, "notes").with_instance("gvim").with_class("Gvim");
        assert_eq!(names(&model, &match_tags(&model, &editor)), vec!["editor"]);

        let scratch = WindowAttributes::new(2, "scratch").with_instance("gvim").with_class("Gvim");
        assert_eq!(names(&model, &match_tags(&model, &scratch)), vec!["default"]);
    }

    #[test]
    fn test_plaintext_role_and_window_id_rules() {
        let model = model();
        let toolbox = WindowAttributes::new(7, "Toolbox").with_role("gimp-toolbox");
        assert_eq!(names(&model, &match_tags(&model, &toolbox)), vec!["gimp"]);

        let pinned = WindowAttributes::new(0x0040_0001, "anything");
        assert_eq!(names(&model, &match_tags(&model, &pinned)), vec!["pinned"]);
    }

    #[test]
    fn test_unmatched_window_gets_default_tag_only() {
        let model = model();
        let window = WindowAttributes::new(1, "mystery").with_class("Unknown");
        let tags = match_tags(&model, &window);
        assert_eq!(tags.as_slice(), &[model.default_tag()]);
        assert!(matching_tags(&model, &window).is_empty());
    }

    #[test]
    fn test_matching_is_deterministic() {
        let model = model();
        let windows = [
            WindowAttributes::new(1, "xterm").with_class("XTerm"),
            WindowAttributes::new(2, "firefox"),
            WindowAttributes::new(3, "other"),
        ];

        let first: Vec<TagSet> = windows.iter().map(|w| match_tags(&model, w)).collect();
        let second: Vec<TagSet> = windows.iter().rev().map(|w| match_tags(&model, w)).collect();

        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_resolve_tag_names_sorts_and_skips_unknown() {
        let model = model();
        let tags = resolve_tag_names(&model, &["console", "nope", "terms", "terms"]);
        assert_eq!(names(&model, &tags), vec!["terms", "console"]);

        let tags = resolve_tag_names::<&str>(&model, &[]);
        assert_eq!(tags.as_slice(), &[model.default_tag()]);
    }
}
