//! Panel item declarations per screen.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// One configured panel item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "item", content = "name", rename_all = "lowercase")]
pub enum PanelItem {
    /// View buttons, one per visible view.
    Views,
    /// Title of the focused client.
    Title,
    /// System tray.
    Tray,
    /// Partial chain of the grab engine.
    Keychain,
    /// Every configured sublet, separated by the separator option.
    Sublets,
    /// A single named sublet slot.
    Sublet(String),
    /// Separator string.
    Separator,
    /// Flexible space.
    Spacer,
}

/// Error for unknown item names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown panel item '{0}'")]
pub struct UnknownPanelItem(pub String);

impl FromStr for PanelItem {
    type Err = UnknownPanelItem;

    /// Parses the fixed item names. Sublet slots are resolved by the builder.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "views" => Ok(Self::Views),
            "title" => Ok(Self::Title),
            "tray" => Ok(Self::Tray),
            "keychain" => Ok(Self::Keychain),
            "sublets" => Ok(Self::Sublets),
            "separator" => Ok(Self::Separator),
            "spacer" => Ok(Self::Spacer),
            other => Err(UnknownPanelItem(other.to_string())),
        }
    }
}

impl fmt::Display for PanelItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Views => f.write_str("views"),
            Self::Title => f.write_str("title"),
            Self::Tray => f.write_str("tray"),
            Self::Keychain => f.write_str("keychain"),
            Self::Sublets => f.write_str("sublets"),
            Self::Sublet(name) => write!(f, "sublet:{name}"),
            Self::Separator => f.write_str("separator"),
            Self::Spacer => f.write_str("spacer"),
        }
    }
}

/// A panel entry: a single item or the center-wrapped group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PanelEntry {
    Item(PanelItem),
    Center(Vec<PanelItem>),
}

/// Top and bottom panels of one screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScreenPanels {
    pub top: Vec<PanelEntry>,
    pub bottom: Vec<PanelEntry>,
}

/// A configured data provider slot.
///
/// Sublet code runs elsewhere; the engine only knows its name and settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sublet {
    pub name: String,
    pub interval: Option<u32>,
    pub properties: serde_json::Map<String, serde_json::Value>,
}
