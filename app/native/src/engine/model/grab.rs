//! Grabs: bindings from chord chains to actions.
//!
//! # Chain Syntax
//!
//! A chain is a space separated list of chords. Each chord is an optional list
//! of modifier letters followed by a key or button, joined with `-`:
//!
//! ```text
//! W-S-1          Super+Shift+1
//! C-y Return     Control+y, then Return
//! W-B1           Super+left mouse button
//! ```
//!
//! Modifiers: `A` Alt, `C` Control, `M` Meta, `S` Shift, `W` Super.
//! Buttons: `B1` to `B5`. Every other token is a keysym name.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use smallvec::SmallVec;
use thiserror::Error;

use super::{GrabId, GravityId};
use crate::engine::hooks::CallbackHandle;

// ============================================================================
// Chords
// ============================================================================

/// Set of modifier keys held during a chord.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Modifiers(u8);

impl Modifiers {
    pub const NONE: Self = Self(0);
    pub const ALT: Self = Self(1);
    pub const CONTROL: Self = Self(1 << 1);
    pub const META: Self = Self(1 << 2);
    pub const SHIFT: Self = Self(1 << 3);
    pub const SUPER: Self = Self(1 << 4);

    /// Display order and configuration letters.
    const LETTERS: [(Self, char); 5] = [
        (Self::SUPER, 'W'),
        (Self::ALT, 'A'),
        (Self::CONTROL, 'C'),
        (Self::META, 'M'),
        (Self::SHIFT, 'S'),
    ];

    /// Parses a single modifier letter.
    #[must_use]
    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "A" => Some(Self::ALT),
            "C" => Some(Self::CONTROL),
            "M" => Some(Self::META),
            "S" => Some(Self::SHIFT),
            "W" => Some(Self::SUPER),
            _ => None,
        }
    }

    #[must_use]
    pub const fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    #[must_use]
    pub const fn union(self, other: Self) -> Self { Self(self.0 | other.0) }

    #[must_use]
    pub const fn is_empty(self) -> bool { self.0 == 0 }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (modifier, letter) in Self::LETTERS {
            if self.contains(modifier) {
                write!(f, "{letter}-")?;
            }
        }
        Ok(())
    }
}

/// The non-modifier part of a chord.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ChordInput {
    /// Keysym name, e.g. `Return` or `KP_7`.
    Key(String),
    /// Pointer button 1 to 5.
    Button(u8),
}

/// One step of a chain: modifiers plus a key or button.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Chord {
    pub modifiers: Modifiers,
    pub input: ChordInput,
}

impl Chord {
    /// Creates a key chord.
    #[must_use]
    pub fn key(modifiers: Modifiers, keysym: impl Into<String>) -> Self {
        Self { modifiers, input: ChordInput::Key(keysym.into()) }
    }

    /// Creates a button chord.
    #[must_use]
    pub const fn button(modifiers: Modifiers, button: u8) -> Self {
        Self { modifiers, input: ChordInput::Button(button) }
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.modifiers)?;
        match &self.input {
            ChordInput::Key(keysym) => write!(f, "{keysym}"),
            ChordInput::Button(button) => write!(f, "B{button}"),
        }
    }
}

/// Errors produced while parsing a chain string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainParseError {
    /// The chain contains no chords.
    #[error("chain is empty")]
    Empty,
    /// A chord ends with a modifier separator and has no key.
    #[error("chord '{0}' has no key or button")]
    MissingKey(String),
    /// A chord prefix is not a known modifier letter.
    #[error("chord '{token}' uses unknown modifier '{modifier}'")]
    UnknownModifier { token: String, modifier: String },
}

impl FromStr for Chord {
    type Err = ChainParseError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let mut parts: Vec<&str> = token.split('-').collect();
        let key = parts.pop().unwrap_or_default();

        if key.is_empty() {
            return Err(ChainParseError::MissingKey(token.to_string()));
        }

        let mut modifiers = Modifiers::NONE;
        for part in parts {
            let modifier =
                Modifiers::from_letter(part).ok_or_else(|| ChainParseError::UnknownModifier {
                    token: token.to_string(),
                    modifier: part.to_string(),
                })?;
            modifiers = modifiers.union(modifier);
        }

        let input = parse_button(key).map_or_else(|| ChordInput::Key(key.to_string()), ChordInput::Button);

        Ok(Self { modifiers, input })
    }
}

/// Parses `B1`..`B5`.
fn parse_button(key: &str) -> Option<u8> {
    key.strip_prefix('B')
        .and_then(|digits| digits.parse::<u8>().ok())
        .filter(|button| (1..=5).contains(button))
}

/// Chord sequence of a grab.
pub type Chain = SmallVec<[Chord; 4]>;

/// Parses a space separated chain string.
///
/// # Errors
///
/// Returns [`ChainParseError`] for empty chains and malformed chords.
pub fn parse_chain(source: &str) -> Result<Chain, ChainParseError> {
    let chain = source.split_whitespace().map(str::parse).collect::<Result<Chain, _>>()?;

    if chain.is_empty() {
        return Err(ChainParseError::Empty);
    }

    Ok(chain)
}

/// Formats a chord sequence the way it is written in configuration.
#[must_use]
pub fn format_chain(chain: &[Chord]) -> String {
    chain.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}

// ============================================================================
// Actions
// ============================================================================

/// Direction for window selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Down,
    Up,
    Right,
}

impl Direction {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Down => "down",
            Self::Up => "up",
            Self::Right => "right",
        }
    }
}

/// Built-in window manager actions.
///
/// Numeric arguments are 1-based, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "action", content = "index", rename_all = "kebab-case")]
pub enum SymbolicAction {
    ViewJump(u8),
    ViewSwitch(u8),
    ViewNext,
    ViewPrev,
    ScreenJump(u8),
    Reload,
    Restart,
    Quit,
    WindowMove,
    WindowResize,
    WindowFloat,
    WindowFull,
    WindowStick,
    WindowRaise,
    WindowLower,
    WindowKill,
    WindowSelect(Direction),
    WindowMoveToScreen(u8),
}

/// Error for action names outside the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}'")]
pub struct UnknownActionError(pub String);

impl FromStr for SymbolicAction {
    type Err = UnknownActionError;

    /// Accepts `ViewJump1` / `SubtleReload` / `WindowLeft` style names as well
    /// as `view-jump-1` / `reload` / `window-select-left`.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownActionError(source.to_string());
        let normalized = normalize_action_name(source);
        let normalized = normalized.strip_prefix("subtle-").unwrap_or(&normalized);

        let (base, index) = match normalized.rsplit_once('-') {
            Some((base, digits)) if digits.chars().all(|c| c.is_ascii_digit()) => {
                let index = digits.parse::<u8>().ok().filter(|n| *n > 0).ok_or_else(unknown)?;
                (base, Some(index))
            }
            _ => (normalized, None),
        };

        let action = match (base, index) {
            ("view-jump", Some(n)) => Self::ViewJump(n),
            ("view-switch", Some(n)) => Self::ViewSwitch(n),
            ("view-next", None) => Self::ViewNext,
            ("view-prev", None) => Self::ViewPrev,
            ("screen-jump", Some(n)) => Self::ScreenJump(n),
            ("reload", None) => Self::Reload,
            ("restart", None) => Self::Restart,
            ("quit", None) => Self::Quit,
            ("window-move", None) => Self::WindowMove,
            ("window-resize", None) => Self::WindowResize,
            ("window-float", None) => Self::WindowFloat,
            ("window-full", None) => Self::WindowFull,
            ("window-stick", None) => Self::WindowStick,
            ("window-raise", None) => Self::WindowRaise,
            ("window-lower", None) => Self::WindowLower,
            ("window-kill", None) => Self::WindowKill,
            ("window-left" | "window-select-left", None) => Self::WindowSelect(Direction::Left),
            ("window-down" | "window-select-down", None) => Self::WindowSelect(Direction::Down),
            ("window-up" | "window-select-up", None) => Self::WindowSelect(Direction::Up),
            ("window-right" | "window-select-right", None) => Self::WindowSelect(Direction::Right),
            ("window-screen" | "window-move-to-screen", Some(n)) => Self::WindowMoveToScreen(n),
            _ => return Err(unknown()),
        };

        Ok(action)
    }
}

/// Lowercases and hyphenates `CamelCase1` names into `camel-case-1`.
fn normalize_action_name(source: &str) -> String {
    let mut normalized = String::with_capacity(source.len() + 4);
    let mut previous: Option<char> = None;

    for ch in source.trim().chars() {
        let ch = if ch == '_' { '-' } else { ch };

        if let Some(prev) = previous {
            let boundary = (prev.is_ascii_lowercase() && ch.is_ascii_uppercase())
                || (prev.is_ascii_alphabetic() && ch.is_ascii_digit());
            if boundary {
                normalized.push('-');
            }
        }

        normalized.push(ch.to_ascii_lowercase());
        previous = Some(ch);
    }

    normalized
}

impl fmt::Display for SymbolicAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ViewJump(n) => write!(f, "view-jump-{n}"),
            Self::ViewSwitch(n) => write!(f, "view-switch-{n}"),
            Self::ViewNext => f.write_str("view-next"),
            Self::ViewPrev => f.write_str("view-prev"),
            Self::ScreenJump(n) => write!(f, "screen-jump-{n}"),
            Self::Reload => f.write_str("reload"),
            Self::Restart => f.write_str("restart"),
            Self::Quit => f.write_str("quit"),
            Self::WindowMove => f.write_str("window-move"),
            Self::WindowResize => f.write_str("window-resize"),
            Self::WindowFloat => f.write_str("window-float"),
            Self::WindowFull => f.write_str("window-full"),
            Self::WindowStick => f.write_str("window-stick"),
            Self::WindowRaise => f.write_str("window-raise"),
            Self::WindowLower => f.write_str("window-lower"),
            Self::WindowKill => f.write_str("window-kill"),
            Self::WindowSelect(direction) => write!(f, "window-select-{}", direction.as_str()),
            Self::WindowMoveToScreen(n) => write!(f, "window-move-to-screen-{n}"),
        }
    }
}

/// What a grab does when its chain completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabAction {
    /// Built-in window manager action.
    Symbolic(SymbolicAction),
    /// Shell command, spawned without waiting.
    Exec(String),
    /// Gravities cycled on the focused client.
    GravityCycle(Vec<GravityId>),
    /// Externally registered callback.
    Callback(CallbackHandle),
}

impl GrabAction {
    /// Short kind label for output.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Symbolic(_) => "action",
            Self::Exec(_) => "exec",
            Self::GravityCycle(_) => "gravity",
            Self::Callback(_) => "callback",
        }
    }
}

/// A compiled grab.
#[derive(Debug, Clone)]
pub struct Grab {
    pub(crate) id: GrabId,
    pub(crate) chain: Chain,
    pub(crate) action: GrabAction,
}

impl Grab {
    #[must_use]
    pub const fn id(&self) -> GrabId { self.id }

    #[must_use]
    pub fn chain(&self) -> &[Chord] { &self.chain }

    #[must_use]
    pub const fn action(&self) -> &GrabAction { &self.action }
}
