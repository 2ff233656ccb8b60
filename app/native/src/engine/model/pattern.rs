//! Window attribute patterns.
//!
//! A [`MatchRule`] pairs a set of [`AttributeKind`]s with a compiled
//! [`Pattern`]. Rules are evaluated against a [`WindowAttributes`] snapshot:
//! a rule matches when any of its selected attributes matches the pattern.
//!
//! # Matching Behavior
//!
//! - Plaintext: case-insensitive substring containment
//! - Regex: case-insensitive, unanchored search
//! - Window id: exact equality with the window id, attribute kinds are ignored
//!
//! Empty attribute values never match. A window without a role cannot be
//! caught by a role rule such as `.*`.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Window attribute a rule can look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Window title (`WM_NAME`).
    Name,
    /// Instance part of `WM_CLASS`.
    Instance,
    /// Class part of `WM_CLASS`.
    Class,
    /// Window role (`WM_WINDOW_ROLE`).
    Role,
    /// Numeric window id.
    WindowId,
}

impl AttributeKind {
    /// Attributes a rule looks at when none are given explicitly.
    pub const DEFAULT: [Self; 2] = [Self::Name, Self::Class];

    /// Returns the lowercase name used in configuration and output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Instance => "instance",
            Self::Class => "class",
            Self::Role => "role",
            Self::WindowId => "id",
        }
    }
}

/// How a pattern compares against an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Plain,
    Regex,
    WindowId,
}

/// Snapshot of the attributes the matcher can see for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowAttributes {
    pub id: u64,
    pub name: String,
    pub instance: String,
    pub class: String,
    pub role: String,
}

impl WindowAttributes {
    /// Creates attributes with a window id and title.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self { id, name: name.into(), ..Self::default() }
    }

    /// Sets the instance part of `WM_CLASS`.
    #[must_use]
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    /// Sets the class part of `WM_CLASS`.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = class.into();
        self
    }

    /// Sets the window role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// Returns the textual value of an attribute.
    ///
    /// Returns `None` for [`AttributeKind::WindowId`], which is compared
    /// numerically instead.
    #[must_use]
    pub fn get(&self, kind: AttributeKind) -> Option<&str> {
        match kind {
            AttributeKind::Name => Some(&self.name),
            AttributeKind::Instance => Some(&self.instance),
            AttributeKind::Class => Some(&self.class),
            AttributeKind::Role => Some(&self.role),
            AttributeKind::WindowId => None,
        }
    }
}

/// A compiled pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Lowercased needle for substring containment.
    Plain(String),
    /// Case-insensitive regular expression.
    Regex(Regex),
    /// Exact window id.
    WindowId(u64),
}

impl Pattern {
    /// Creates a plaintext pattern.
    #[must_use]
    pub fn plain(text: &str) -> Self { Self::Plain(text.to_lowercase()) }

    /// Compiles a case-insensitive regular expression.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error for malformed expressions.
    pub fn regex(source: &str) -> Result<Self, regex::Error> {
        RegexBuilder::new(source).case_insensitive(true).build().map(Self::Regex)
    }

    /// Creates an exact window id pattern.
    #[must_use]
    pub const fn window_id(id: u64) -> Self { Self::WindowId(id) }

    /// Returns the kind of this pattern.
    #[must_use]
    pub const fn kind(&self) -> PatternKind {
        match self {
            Self::Plain(_) => PatternKind::Plain,
            Self::Regex(_) => PatternKind::Regex,
            Self::WindowId(_) => PatternKind::WindowId,
        }
    }

    /// Tests a textual attribute value.
    #[must_use]
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Plain(needle) => value.to_lowercase().contains(needle.as_str()),
            Self::Regex(regex) => regex.is_match(value),
            Self::WindowId(_) => false,
        }
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(needle) => write!(f, "\"{needle}\""),
            Self::Regex(regex) => write!(f, "/{}/", regex.as_str()),
            Self::WindowId(id) => write!(f, "#{id:#x}"),
        }
    }
}

/// A single match or exclude rule of a tag.
#[derive(Debug, Clone)]
pub struct MatchRule {
    attributes: SmallVec<[AttributeKind; 2]>,
    pattern: Pattern,
}

impl MatchRule {
    /// Creates a rule over the given attributes.
    ///
    /// An empty attribute list selects [`AttributeKind::DEFAULT`]. Window id
    /// patterns always look at the window id only.
    #[must_use]
    pub fn new(attributes: impl IntoIterator<Item = AttributeKind>, pattern: Pattern) -> Self {
        let mut attributes: SmallVec<[AttributeKind; 2]> = attributes.into_iter().collect();

        if matches!(pattern, Pattern::WindowId(_)) {
            attributes = SmallVec::from_slice(&[AttributeKind::WindowId]);
        } else if attributes.is_empty() {
            attributes = SmallVec::from_slice(&AttributeKind::DEFAULT);
        }

        Self { attributes, pattern }
    }

    /// Returns the attributes this rule looks at.
    #[must_use]
    pub fn attributes(&self) -> &[AttributeKind] { &self.attributes }

    /// Returns the compiled pattern.
    #[must_use]
    pub const fn pattern(&self) -> &Pattern { &self.pattern }

    /// Checks whether the rule matches a window.
    #[must_use]
    pub fn matches(&self, window: &WindowAttributes) -> bool {
        if let Pattern::WindowId(id) = self.pattern {
            return window.id == id;
        }

        self.attributes
            .iter()
            .filter_map(|kind| window.get(*kind))
            .filter(|value| !value.is_empty())
            .any(|value| self.pattern.is_match(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xterm() -> WindowAttributes {
        WindowAttributes::new(0x0040_0001, "~ : zsh").with_instance("xterm").with_class("XTerm")
    }

    #[test]
    fn test_plain_pattern_is_case_insensitive_substring() {
        let pattern = Pattern::plain("TERM");
        assert!(pattern.is_match("XTerm"));
        assert!(!pattern.is_match("firefox"));
        assert_eq!(pattern.kind(), PatternKind::Plain);
    }

    #[test]
    fn test_regex_pattern_searches_unanchored() {
        let pattern = Pattern::regex("[u]?rxvt").unwrap();
        assert!(pattern.is_match("urxvt-256color"));
        assert!(pattern.is_match("RXVT"));
        assert!(!pattern.is_match("xterm"));
    }

    #[test]
    fn test_malformed_regex_is_an_error() {
        assert!(Pattern::regex("gimp-(dock").is_err());
    }

    #[test]
    fn test_default_rule_looks_at_name_and_class() {
        let rule = MatchRule::new([], Pattern::regex("^xterm$").unwrap());
        assert_eq!(rule.attributes(), &AttributeKind::DEFAULT);
        // Instance is "xterm" but the class is "XTerm", which still matches case-insensitively
        assert!(rule.matches(&xterm()));

        let window = WindowAttributes::new(1, "editor").with_instance("xterm").with_class("Other");
        assert!(!rule.matches(&window));
    }

    #[test]
    fn test_rule_on_single_attribute() {
        let rule = MatchRule::new([AttributeKind::Instance], Pattern::plain("xterm"));
        assert!(rule.matches(&xterm()));

        let rule = MatchRule::new([AttributeKind::Role], Pattern::plain("xterm"));
        assert!(!rule.matches(&xterm()));
    }

    #[test]
    fn test_empty_attribute_never_matches() {
        let rule = MatchRule::new([AttributeKind::Role], Pattern::regex(".*").unwrap());
        assert!(!rule.matches(&xterm()));
        assert!(rule.matches(&xterm().with_role("browser")));
    }

    #[test]
    fn test_window_id_rule_ignores_attribute_kinds() {
        let rule = MatchRule::new([AttributeKind::Name], Pattern::window_id(0x0040_0001));
        assert_eq!(rule.attributes(), &[AttributeKind::WindowId]);
        assert!(rule.matches(&xterm()));
        assert!(!rule.matches(&WindowAttributes::new(2, "~ : zsh")));
    }

    #[test]
    fn test_pattern_display() {
        assert_eq!(Pattern::plain("Foo").to_string(), "\"foo\"");
        assert_eq!(Pattern::regex("a|b").unwrap().to_string(), "/a|b/");
        assert_eq!(Pattern::window_id(255).to_string(), "#0xff");
    }
}
