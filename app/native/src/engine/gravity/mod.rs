//! Gravity resolution and gravity cycling.
//!
//! A gravity is a rectangle in percent of a usable area. Resolution turns it
//! into pixels:
//!
//! ```text
//! x      = area.x + round(area.width  * gx / 100)
//! y      = area.y + round(area.height * gy / 100)
//! width  =          round(area.width  * gw / 100)
//! height =          round(area.height * gh / 100)
//! ```
//!
//! The result is then pulled back inside the area, so edge-anchored gravities
//! such as `[100, 0, 50, 50]` land on the right half. Rectangles that already
//! fit are never changed.
//!
//! The `0/0/0/0` sentinel keeps the client's previous geometry.

use std::collections::HashMap;

use crate::engine::model::{Gravity, GrabId};
use crate::engine::state::{ClientId, Rect};

/// Scales `length` by `percent`, rounding to the nearest pixel.
fn scale(length: i32, percent: u8) -> i32 {
    let scaled = (i64::from(length) * i64::from(percent) * 2 + 100) / 200;
    i32::try_from(scaled).unwrap_or(i32::MAX)
}

/// Resolves a gravity against a usable area.
///
/// The sentinel gravity resolves to the whole area; use [`apply_gravity`] to
/// honor its pass-through meaning.
#[must_use]
pub fn resolve(gravity: &Gravity, area: Rect) -> Rect {
    if gravity.is_sentinel() {
        return area;
    }

    let [gx, gy, gw, gh] = gravity.percentages();
    let rect = Rect::new(
        area.x + scale(area.width, gx),
        area.y + scale(area.height, gy),
        scale(area.width, gw),
        scale(area.height, gh),
    );

    rect.clamp_within(area)
}

/// Computes the geometry for a client from an optional gravity.
///
/// # Arguments
///
/// * `gravity` - Gravity to apply, `None` to use the fallback
/// * `area` - Usable area of the client's screen
/// * `previous` - Last known geometry of the client
/// * `fallback` - Default gravity for clients without a usable gravity
///
/// # Returns
///
/// The gravity's rectangle; for the sentinel, the previous geometry; when
/// nothing applies, the default gravity, and finally the whole area.
#[must_use]
pub fn apply_gravity(
    gravity: Option<&Gravity>,
    area: Rect,
    previous: Option<Rect>,
    fallback: Option<&Gravity>,
) -> Rect {
    match gravity {
        Some(gravity) if !gravity.is_sentinel() => resolve(gravity, area),
        Some(_) => previous.unwrap_or_else(|| resolve_fallback(fallback, area, None)),
        None => resolve_fallback(fallback, area, previous),
    }
}

fn resolve_fallback(fallback: Option<&Gravity>, area: Rect, previous: Option<Rect>) -> Rect {
    match fallback {
        Some(fallback) if !fallback.is_sentinel() => resolve(fallback, area),
        _ => previous.unwrap_or(area),
    }
}

/// Per-(client, grab) cursors into gravity cycle lists.
#[derive(Debug, Default, Clone)]
pub struct GravityCycles {
    cursors: HashMap<(ClientId, GrabId), usize>,
}

impl GravityCycles {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Advances the cursor of a cycle and returns the index to apply.
    ///
    /// The first call for a (client, grab) pair yields 0; later calls walk
    /// the list and wrap around. Returns `None` for empty lists.
    pub fn advance(&mut self, client: ClientId, grab: GrabId, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }

        let next = match self.cursors.get(&(client, grab)) {
            Some(current) => (current + 1) % len,
            None => 0,
        };
        self.cursors.insert((client, grab), next);

        Some(next)
    }

    /// Forgets all cursors of a client.
    pub fn reset_client(&mut self, client: ClientId) {
        self.cursors.retain(|(owner, _), _| *owner != client);
    }

    /// Forgets every cursor.
    pub fn clear(&mut self) { self.cursors.clear(); }
}
