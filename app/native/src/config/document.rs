//! Configuration document types.
//!
//! These types mirror the JSONC file one to one. They are deliberately
//! permissive: names are not checked for uniqueness, patterns are not
//! compiled and references are not resolved here. The
//! [`ModelBuilder`](super::ModelBuilder) does all of that and reports what
//! it had to skip.
//!
//! Tags, views, gravities, grabs and sublets accept two shapes:
//!
//! - an array of blocks, each carrying its own `name` (or `chain`)
//! - an object keyed by name, whose values are blocks or short forms
//!
//! Object entries are parsed one by one, so a single malformed entry is
//! reported and skipped instead of rejecting the whole file.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::model::{DefaultsProfile, WindowType};

/// Root of a configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigDocument {
    /// JSON schema reference, ignored by the loader.
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Built-in defaults to start from: `current` or `legacy`.
    pub defaults: DefaultsProfile,

    /// Global options. Unset options take the profile default.
    pub options: OptionsDoc,

    /// Style blocks, passed through untouched to the renderer.
    pub styles: Map<String, Value>,

    /// Gravities in percent: `{ "name": [x, y, width, height] }`.
    pub gravities: Blocks<GravityBlock>,

    /// Key and button grabs: `{ "W-1": "ViewJump1" }`.
    pub grabs: Blocks<GrabBlock>,

    /// Tags: `{ "terms": "xterm|urxvt" }` or full blocks.
    pub tags: Blocks<TagBlock>,

    /// Views: `{ "www": "browser" }` or full blocks.
    pub views: Blocks<ViewBlock>,

    /// Panel items per screen. Omitted: one screen with the default top panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub screens: Option<Vec<ScreenDoc>>,

    /// Sublet settings keyed by sublet name.
    pub sublets: Blocks<SubletBlock>,

    /// Callbacks per lifecycle event.
    pub hooks: BTreeMap<String, HookTargets>,
}

// ============================================================================
// Block collections
// ============================================================================

/// A block type that can also be written as `name: value` in a table.
pub trait NamedBlock: Sized + DeserializeOwned {
    /// Builds a block from a table key and value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has neither a short nor a block form.
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error>;
}

/// Either an array of blocks or a table keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Blocks<T> {
    List(Vec<T>),
    Table(Map<String, Value>),
}

impl<T> Default for Blocks<T> {
    fn default() -> Self { Self::List(Vec::new()) }
}

/// A table entry that could not be parsed.
#[derive(Debug)]
pub struct EntryError {
    pub name: String,
    pub error: serde_json::Error,
}

impl<T: NamedBlock + Clone> Blocks<T> {
    /// Returns the blocks in document order.
    ///
    /// Table entries are parsed here; failures are returned in place so
    /// the caller can report them.
    #[must_use]
    pub fn entries(&self) -> Vec<Result<T, EntryError>> {
        match self {
            Self::List(blocks) => blocks.iter().cloned().map(Ok).collect(),
            Self::Table(table) => table
                .iter()
                .map(|(name, value)| {
                    T::from_entry(name, value.clone())
                        .map_err(|error| EntryError { name: name.clone(), error })
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::List(blocks) => blocks.is_empty(),
            Self::Table(table) => table.is_empty(),
        }
    }
}

/// Inserts `key: name` into an object value before deserializing it.
fn with_key<T: DeserializeOwned>(key: &str, name: &str, value: Value) -> Result<T, serde_json::Error> {
    match value {
        Value::Object(mut object) => {
            object.insert(key.to_string(), Value::String(name.to_string()));
            serde_json::from_value(Value::Object(object))
        }
        other => serde_json::from_value(other),
    }
}

// ============================================================================
// Options
// ============================================================================

/// Global options as written. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct OptionsDoc {
    /// Move/resize step in pixels.
    pub step: Option<u32>,
    /// Edge snapping distance in pixels.
    pub snap: Option<u32>,
    /// Default gravity name.
    pub gravity: Option<String>,
    /// Make transient windows urgent.
    pub urgent: Option<bool>,
    /// Honor size hints.
    pub resize: Option<bool>,
    /// Panel font.
    pub font: Option<String>,
    /// Separator between sublets.
    pub separator: Option<String>,
    /// Client border width in pixels.
    pub border: Option<u32>,
    /// Screen padding: `[left, right, top, bottom]`.
    pub padding: Option<[i32; 4]>,
    /// Panel height in pixels.
    pub panel_height: Option<u32>,
    /// Timeout for ambiguous key chains, in milliseconds.
    pub chain_timeout_ms: Option<u64>,
    /// Tag for windows no tag matches.
    pub default_tag: Option<String>,
}

// ============================================================================
// Gravities
// ============================================================================

/// A named gravity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GravityBlock {
    pub name: String,
    /// `[x, y, width, height]` in percent, each 0..=100.
    pub geometry: [u32; 4],
}

impl NamedBlock for GravityBlock {
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error> {
        if value.is_array() {
            let geometry = serde_json::from_value(value)?;
            return Ok(Self { name: name.to_string(), geometry });
        }
        with_key("name", name, value)
    }
}

// ============================================================================
// Grabs
// ============================================================================

/// A key or button binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GrabBlock {
    /// Chord chain, e.g. `W-S-1` or `C-y Return`.
    pub chain: String,
    pub action: GrabActionDoc,
}

impl NamedBlock for GrabBlock {
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error> {
        Ok(Self { chain: name.to_string(), action: serde_json::from_value(value)? })
    }
}

/// What a grab does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum GrabActionDoc {
    /// A built-in action name, or a shell command if it is not one.
    Command(String),
    /// Gravity names cycled on the focused client.
    Cycle(Vec<String>),
    /// An explicit built-in action.
    Action { action: String },
    /// An explicit shell command.
    Exec { exec: String },
    /// An explicit gravity cycle.
    Gravities { gravities: Vec<String> },
    /// A registered callback.
    Callback { callback: String },
}

// ============================================================================
// Tags
// ============================================================================

/// A tag: match rules plus the properties it gives to matching clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct TagBlock {
    pub name: String,
    /// Rules that select windows; any rule matching is enough.
    #[serde(rename = "match", alias = "regex", skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchDoc>,
    /// Rules that reject windows even if a match rule fired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude: Option<MatchDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stick: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resize: Option<bool>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub window_type: Option<WindowType>,
    /// Gravity name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gravity: Option<String>,
    /// Fixed `[x, y, width, height]` in pixels, relative to the usable area.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<[i32; 4]>,
}

impl NamedBlock for TagBlock {
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::String(pattern) => Ok(Self {
                name: name.to_string(),
                matches: Some(MatchDoc::Pattern(pattern)),
                ..Self::default()
            }),
            other => with_key("name", name, other),
        }
    }
}

/// Match rules in any of their written forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MatchDoc {
    /// A regex tested against name and class.
    Pattern(String),
    /// Several rules, any of which may match.
    Rules(Vec<MatchRuleDoc>),
    /// A single rule.
    Rule(MatchRuleDoc),
}

impl MatchDoc {
    /// Returns the rules in written order.
    #[must_use]
    pub fn rules(&self) -> Vec<MatchRuleDoc> {
        match self {
            Self::Pattern(pattern) => {
                vec![MatchRuleDoc { regex: Some(pattern.clone()), ..MatchRuleDoc::default() }]
            }
            Self::Rules(rules) => rules.clone(),
            Self::Rule(rule) => vec![rule.clone()],
        }
    }
}

/// One rule object. Each attribute set in it is a separate rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MatchRuleDoc {
    /// Pattern for name and class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    /// Pattern for the window title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Pattern for the `WM_CLASS` instance.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
    /// Pattern for the `WM_CLASS` class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Pattern for the window role.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Exact window id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// Treat the patterns of this rule as plain substrings.
    pub plain: bool,
}

// ============================================================================
// Views
// ============================================================================

/// A view and the tag pattern selecting its clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewBlock {
    pub name: String,
    /// Regex over tag names. Defaults to the view name itself.
    #[serde(rename = "match", alias = "regex", skip_serializing_if = "Option::is_none")]
    pub matches: Option<String>,
    /// Hide the view while no client is on it.
    pub dynamic: bool,
    /// Icon shown in the panel.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Show only the icon.
    pub icon_only: bool,
}

impl NamedBlock for ViewBlock {
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::String(pattern) => {
                Ok(Self { name: name.to_string(), matches: Some(pattern), ..Self::default() })
            }
            other => with_key("name", name, other),
        }
    }
}

// ============================================================================
// Screens, sublets, hooks
// ============================================================================

/// Panel items of one screen.
///
/// Items: `views`, `title`, `tray`, `keychain`, `sublets`, `separator`,
/// `spacer`, `center` (toggles the centered group), `sublet:<name>` or a
/// bare sublet name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ScreenDoc {
    pub top: Vec<String>,
    pub bottom: Vec<String>,
}

/// Settings of one sublet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SubletBlock {
    pub name: String,
    /// Update interval in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// Any other settings, handed to the sublet.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl NamedBlock for SubletBlock {
    fn from_entry(name: &str, value: Value) -> Result<Self, serde_json::Error> {
        with_key("name", name, value)
    }
}

/// One callback name or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum HookTargets {
    One(String),
    Many(Vec<String>),
}

impl HookTargets {
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_parses() {
        let doc: ConfigDocument = serde_json::from_str("{}").unwrap();
        assert!(doc.tags.is_empty());
        assert!(doc.screens.is_none());
        assert_eq!(doc.defaults, DefaultsProfile::Current);
    }

    #[test]
    fn test_tag_table_short_and_block_forms() {
        let doc: ConfigDocument = serde_json::from_str(
            r#"{ "tags": { "terms": "xterm", "float": { "regex": "mplayer", "float": true } } }"#,
        )
        .unwrap();

        let tags: Vec<TagBlock> = doc.tags.entries().into_iter().map(Result::unwrap).collect();
        assert_eq!(tags[0].name, "terms");
        assert_eq!(tags[0].matches, Some(MatchDoc::Pattern("xterm".into())));
        assert_eq!(tags[1].name, "float");
        assert_eq!(tags[1].float, Some(true));
    }

    #[test]
    fn test_bad_table_entry_is_reported_alone() {
        let doc: ConfigDocument =
            serde_json::from_str(r#"{ "gravities": { "ok": [0, 0, 50, 50], "bad": "wide" } }"#)
                .unwrap();

        let entries = doc.gravities.entries();
        assert!(entries[0].is_ok());
        assert_eq!(entries[1].as_ref().unwrap_err().name, "bad");
    }

    #[test]
    fn test_grab_action_forms() {
        let doc: ConfigDocument = serde_json::from_str(
            r#"{ "grabs": {
                "W-1": "ViewJump1",
                "W-KP_7": ["top_left", "top_left66"],
                "W-Return": { "exec": "xterm" },
                "S-F2": { "callback": "print_name" }
            } }"#,
        )
        .unwrap();

        let grabs: Vec<GrabBlock> = doc.grabs.entries().into_iter().map(Result::unwrap).collect();
        assert_eq!(grabs[0].action, GrabActionDoc::Command("ViewJump1".into()));
        assert_eq!(grabs[1].action, GrabActionDoc::Cycle(vec!["top_left".into(), "top_left66".into()]));
        assert_eq!(grabs[2].action, GrabActionDoc::Exec { exec: "xterm".into() });
        assert_eq!(grabs[3].action, GrabActionDoc::Callback { callback: "print_name".into() });
    }

    #[test]
    fn test_match_rule_forms() {
        let rule: MatchDoc = serde_json::from_str(r#"{ "class": "Gimp", "plain": true }"#).unwrap();
        let rules = rule.rules();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].plain);

        let list: MatchDoc = serde_json::from_str(r#"[{ "name": "a" }, { "id": 7 }]"#).unwrap();
        assert_eq!(list.rules()[1].id, Some(7));
    }

    #[test]
    fn test_sublet_keeps_extra_properties() {
        let doc: ConfigDocument =
            serde_json::from_str(r#"{ "sublets": { "clock": { "interval": 30, "format": "%H:%M" } } }"#)
                .unwrap();
        let sublet = doc.sublets.entries().remove(0).unwrap();
        assert_eq!(sublet.name, "clock");
        assert_eq!(sublet.interval, Some(30));
        assert_eq!(sublet.properties.get("format"), Some(&Value::String("%H:%M".into())));
    }
}
