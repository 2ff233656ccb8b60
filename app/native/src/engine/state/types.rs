//! Core runtime types: geometry, clients and screens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::engine::model::{GravityId, TagId, ViewId, WindowAttributes, WindowType};

// ============================================================================
// Geometry
// ============================================================================

/// A pixel rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self { Self { x, y, width, height } }

    /// Creates a rectangle from `[x, y, width, height]`.
    #[must_use]
    pub const fn from_array([x, y, width, height]: [i32; 4]) -> Self { Self::new(x, y, width, height) }

    /// Creates a zero-sized rectangle at the origin.
    #[must_use]
    pub const fn zero() -> Self { Self::new(0, 0, 0, 0) }

    /// Whether the rectangle has a positive area.
    #[must_use]
    pub const fn is_valid(&self) -> bool { self.width > 0 && self.height > 0 }

    #[must_use]
    pub const fn right(&self) -> i32 { self.x + self.width }

    #[must_use]
    pub const fn bottom(&self) -> i32 { self.y + self.height }

    /// Moves the rectangle by an offset.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Shrinks the rectangle from each edge. Sizes never drop below zero.
    #[must_use]
    pub fn shrink(self, left: i32, right: i32, top: i32, bottom: i32) -> Self {
        Self::new(
            self.x + left,
            self.y + top,
            (self.width - left - right).max(0),
            (self.height - top - bottom).max(0),
        )
    }

    /// Pulls the origin back so the rectangle stays inside `area`.
    ///
    /// Rectangles larger than `area` are aligned to its origin.
    #[must_use]
    pub fn clamp_within(self, area: Self) -> Self {
        let x = self.x.min(area.right() - self.width).max(area.x);
        let y = self.y.min(area.bottom() - self.height).max(area.y);
        Self::new(x, y, self.width, self.height)
    }
}

impl fmt::Display for Rect {
    /// Formats as an X11 geometry string, `WxH+X+Y`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}{:+}{:+}", self.width, self.height, self.x, self.y)
    }
}

/// Error for malformed geometry strings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid geometry '{0}', expected WxH+X+Y")]
pub struct GeometryParseError(pub String);

impl FromStr for Rect {
    type Err = GeometryParseError;

    /// Parses `WxH`, `WxH+X+Y` or `WxH-X-Y`.
    fn from_str(source: &str) -> Result<Self, Self::Err> {
        let invalid = || GeometryParseError(source.to_string());

        let (size, offset) = source
            .find(['+', '-'])
            .map_or((source, ""), |split| source.split_at(split));
        let (width, height) = size.split_once('x').ok_or_else(invalid)?;
        let width = width.parse().map_err(|_| invalid())?;
        let height = height.parse().map_err(|_| invalid())?;

        let (x, y) = if offset.is_empty() {
            (0, 0)
        } else {
            let second = offset[1..].find(['+', '-']).map(|i| i + 1).ok_or_else(invalid)?;
            let (x, y) = offset.split_at(second);
            (x.parse().map_err(|_| invalid())?, y.parse().map_err(|_| invalid())?)
        };

        Ok(Self::new(x, y, width, height))
    }
}

// ============================================================================
// Clients
// ============================================================================

/// Window id of a managed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

/// Tags of a client, in declaration order.
pub type TagSet = SmallVec<[TagId; 4]>;

/// Views a client is a member of, in declaration order.
pub type ViewSet = SmallVec<[ViewId; 4]>;

/// Mode flags of a client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClientFlags {
    pub floating: bool,
    pub full: bool,
    pub sticky: bool,
    pub urgent: bool,
    pub resize: bool,
}

/// A managed window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: ClientId,
    pub attributes: WindowAttributes,
    pub transient: bool,
    pub tags: TagSet,
    /// Views by tag membership. Sticky clients are additionally visible everywhere.
    pub views: ViewSet,
    pub flags: ClientFlags,
    pub window_type: WindowType,
    /// Gravity currently applied, if any.
    pub gravity: Option<GravityId>,
    /// 0-based screen index.
    pub screen: usize,
    pub geometry: Option<Rect>,
}

impl Client {
    /// Whether the client shows on `view`.
    #[must_use]
    pub fn is_visible_on(&self, view: ViewId) -> bool {
        self.flags.sticky || self.views.contains(&view)
    }

    /// Whether the client carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: TagId) -> bool { self.tags.contains(&tag) }
}

// ============================================================================
// Screens
// ============================================================================

/// A physical screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Screen {
    /// 0-based screen index.
    pub id: usize,
    /// Full screen geometry.
    pub geometry: Rect,
    /// Geometry minus padding and visible panels.
    pub area: Rect,
    pub active_view: ViewId,
    pub top_panel: bool,
    pub bottom_panel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_edges_and_validity() {
        let rect = Rect::new(10, 20, 100, 50);
        assert_eq!(rect.right(), 110);
        assert_eq!(rect.bottom(), 70);
        assert!(rect.is_valid());
        assert!(!Rect::zero().is_valid());
    }

    #[test]
    fn test_rect_offset_keeps_size() {
        let rect = Rect::new(0, 0, 100, 100).offset(1920, -10);
        assert_eq!(rect, Rect::new(1920, -10, 100, 100));
    }

    #[test]
    fn test_rect_shrink_never_negative() {
        let rect = Rect::new(0, 0, 1920, 1080).shrink(10, 10, 18, 0);
        assert_eq!(rect, Rect::new(10, 18, 1900, 1062));
        assert_eq!(Rect::new(0, 0, 10, 10).shrink(8, 8, 0, 0).width, 0);
    }

    #[test]
    fn test_rect_clamp_within_area() {
        let area = Rect::new(0, 0, 1920, 1080);
        assert_eq!(Rect::new(1920, 0, 960, 540).clamp_within(area), Rect::new(960, 0, 960, 540));
        assert_eq!(Rect::new(100, 100, 200, 200).clamp_within(area), Rect::new(100, 100, 200, 200));
        assert_eq!(Rect::new(-50, -20, 10, 10).clamp_within(area), Rect::new(0, 0, 10, 10));
    }

    #[test]
    fn test_rect_geometry_string() {
        let rect: Rect = "1920x1080+0+18".parse().unwrap();
        assert_eq!(rect, Rect::new(0, 18, 1920, 1080));
        assert_eq!(rect.to_string(), "1920x1080+0+18");

        let rect: Rect = "800x600".parse().unwrap();
        assert_eq!(rect, Rect::new(0, 0, 800, 600));

        let rect: Rect = "800x600-10+5".parse().unwrap();
        assert_eq!((rect.x, rect.y), (-10, 5));

        assert!("800".parse::<Rect>().is_err());
        assert!("axb+0+0".parse::<Rect>().is_err());
        assert!("800x600+10".parse::<Rect>().is_err());
    }

    #[test]
    fn test_client_id_display_is_hex() {
        assert_eq!(ClientId(0x0040_0001).to_string(), "0x400001");
    }
}
