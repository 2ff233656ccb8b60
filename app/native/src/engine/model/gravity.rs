//! Gravities: named rectangles in percent of the usable screen area.

use super::GravityId;

/// A named percentage rectangle.
///
/// `0/0/0/0` is the sentinel meaning "keep the previous geometry".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gravity {
    pub(crate) id: GravityId,
    pub(crate) name: String,
    pub(crate) x: u8,
    pub(crate) y: u8,
    pub(crate) width: u8,
    pub(crate) height: u8,
}

impl Gravity {
    /// Creates a gravity from `[x, y, width, height]` percentages.
    #[must_use]
    pub fn new(id: GravityId, name: impl Into<String>, [x, y, width, height]: [u8; 4]) -> Self {
        Self { id, name: name.into(), x, y, width, height }
    }

    #[must_use]
    pub const fn id(&self) -> GravityId { self.id }

    #[must_use]
    pub fn name(&self) -> &str { &self.name }

    /// Returns `[x, y, width, height]` in percent.
    #[must_use]
    pub const fn percentages(&self) -> [u8; 4] { [self.x, self.y, self.width, self.height] }

    /// Whether this is the pass-through sentinel.
    #[must_use]
    pub const fn is_sentinel(&self) -> bool {
        self.x == 0 && self.y == 0 && self.width == 0 && self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_detection() {
        assert!(Gravity::new(GravityId(0), "keep", [0, 0, 0, 0]).is_sentinel());
        assert!(!Gravity::new(GravityId(1), "center", [0, 0, 100, 100]).is_sentinel());
    }

    #[test]
    fn test_percentages_order() {
        let gravity = Gravity::new(GravityId(0), "center33", [50, 50, 50, 34]);
        assert_eq!(gravity.percentages(), [50, 50, 50, 34]);
        assert_eq!(gravity.name(), "center33");
    }
}
