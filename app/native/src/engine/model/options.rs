//! Global engine options.

use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::GravityId;

/// Which set of built-in defaults a document starts from.
///
/// `current` follows the block-style stock configuration (transient windows
/// are not urgent, thirds use 34%). `legacy` follows the flat-table stock
/// configuration (transient windows are urgent, thirds use 33%, 2px borders).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum DefaultsProfile {
    #[default]
    Current,
    Legacy,
}

/// Screen padding in pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub left: i32,
    pub right: i32,
    pub top: i32,
    pub bottom: i32,
}

impl Padding {
    /// Creates padding from `[left, right, top, bottom]`.
    #[must_use]
    pub const fn from_array([left, right, top, bottom]: [i32; 4]) -> Self {
        Self { left, right, top, bottom }
    }
}

/// Resolved global options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// Move/resize step in pixels per key press.
    pub step: u32,
    /// Screen edge snapping distance in pixels.
    pub snap: u32,
    /// Gravity for new clients without a tag gravity.
    pub default_gravity: Option<GravityId>,
    /// Make transient windows urgent.
    pub urgent: bool,
    /// Honor size hints.
    pub resize: bool,
    pub font: String,
    pub separator: String,
    pub border: u32,
    pub padding: Padding,
    pub panel_height: u32,
    /// Ambiguous chain timeout.
    #[serde(with = "duration_ms")]
    pub chain_timeout: Duration,
    pub profile: DefaultsProfile,
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }
}
