//! Panel layout.
//!
//! Configured [`PanelEntry`] lists are first expanded into concrete cells
//! (one button per visible view, one slot per sublet) and then laid out into
//! a pixel width:
//!
//! 1. Sum the natural widths of fixed cells and count spacers
//! 2. Give each spacer `remaining / spacers`; the last spacer also takes the
//!    remainder, so the panel is filled exactly
//!
//! A center group is a single block placed at `(total - group) / 2`. Cells
//! before it fill the segment to its left, cells after it the segment to its
//! right, and each segment distributes its own spacers.
//!
//! Natural widths are measured by the caller. [`TextMetrics`] provides a
//! fixed-pitch approximation for tools without a renderer.

use serde::Serialize;

use crate::engine::model::{ConfigModel, PanelEntry, PanelItem, Sublet, ViewId};

/// A concrete panel element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cell", content = "id", rename_all = "camelCase")]
pub enum PanelCell {
    ViewButton(ViewId),
    Title,
    Tray,
    Keychain,
    Sublet(String),
    Separator,
    Spacer,
}

impl PanelCell {
    #[must_use]
    pub const fn is_spacer(&self) -> bool { matches!(self, Self::Spacer) }
}

/// An expanded entry: a cell or the center group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PanelSlot {
    Cell(PanelCell),
    Center(Vec<PanelCell>),
}

/// A cell with its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelPlacement {
    pub cell: PanelCell,
    pub x: u32,
    pub width: u32,
}

/// Result of laying out one panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelLayout {
    pub placements: Vec<PanelPlacement>,
    pub width: u32,
    pub height: u32,
    pub hidden: bool,
}

impl PanelLayout {
    #[must_use]
    pub fn hidden() -> Self { Self { hidden: true, ..Self::default() } }

    /// Returns the rightmost edge of any placement.
    #[must_use]
    pub fn occupied(&self) -> u32 {
        self.placements.iter().map(|p| p.x + p.width).max().unwrap_or(0)
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Expands configured entries into cells.
///
/// # Arguments
///
/// * `entries` - Configured panel entries of one panel
/// * `views` - Views to show buttons for, in order
/// * `sublets` - Configured sublets, used by the `sublets` item
#[must_use]
pub fn expand(entries: &[PanelEntry], views: &[ViewId], sublets: &[Sublet]) -> Vec<PanelSlot> {
    let mut slots = Vec::with_capacity(entries.len());

    for entry in entries {
        match entry {
            PanelEntry::Item(item) => {
                let mut cells = Vec::new();
                expand_item(item, views, sublets, &mut cells);
                slots.extend(cells.into_iter().map(PanelSlot::Cell));
            }
            PanelEntry::Center(items) => {
                let mut cells = Vec::new();
                for item in items {
                    expand_item(item, views, sublets, &mut cells);
                }
                slots.push(PanelSlot::Center(cells));
            }
        }
    }

    slots
}

fn expand_item(item: &PanelItem, views: &[ViewId], sublets: &[Sublet], out: &mut Vec<PanelCell>) {
    match item {
        PanelItem::Views => out.extend(views.iter().copied().map(PanelCell::ViewButton)),
        PanelItem::Title => out.push(PanelCell::Title),
        PanelItem::Tray => out.push(PanelCell::Tray),
        PanelItem::Keychain => out.push(PanelCell::Keychain),
        PanelItem::Sublets => {
            for (index, sublet) in sublets.iter().enumerate() {
                if index > 0 {
                    out.push(PanelCell::Separator);
                }
                out.push(PanelCell::Sublet(sublet.name.clone()));
            }
        }
        PanelItem::Sublet(name) => out.push(PanelCell::Sublet(name.clone())),
        PanelItem::Separator => out.push(PanelCell::Separator),
        PanelItem::Spacer => out.push(PanelCell::Spacer),
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Lays out slots into `total` pixels.
///
/// `measure` returns the natural width of a fixed cell; it is never called
/// for spacers. An empty slot list yields a hidden layout.
pub fn layout(
    slots: &[PanelSlot],
    total: u32,
    height: u32,
    measure: impl Fn(&PanelCell) -> u32,
) -> PanelLayout {
    if slots.is_empty() {
        return PanelLayout::hidden();
    }

    let mut placements = Vec::new();

    match slots.iter().position(|slot| matches!(slot, PanelSlot::Center(_))) {
        None => {
            let cells: Vec<&PanelCell> = slots.iter().filter_map(slot_cell).collect();
            layout_segment(&cells, 0, total, &measure, &mut placements);
        }
        Some(index) => {
            let group: &[PanelCell] = match &slots[index] {
                PanelSlot::Center(cells) => cells,
                PanelSlot::Cell(_) => &[],
            };
            let group_width: u32 = group.iter().map(|cell| natural_width(cell, &measure)).sum();
            let start = total.saturating_sub(group_width) / 2;
            let end = (start + group_width).min(total);

            let before: Vec<&PanelCell> = slots[..index].iter().filter_map(slot_cell).collect();
            let after: Vec<&PanelCell> = slots[index + 1..].iter().filter_map(slot_cell).collect();

            layout_segment(&before, 0, start, &measure, &mut placements);

            let mut x = start;
            for cell in group {
                let width = natural_width(cell, &measure);
                placements.push(PanelPlacement { cell: cell.clone(), x, width });
                x += width;
            }

            layout_segment(&after, end, total - end, &measure, &mut placements);
        }
    }

    PanelLayout { placements, width: total, height, hidden: false }
}

fn slot_cell(slot: &PanelSlot) -> Option<&PanelCell> {
    match slot {
        PanelSlot::Cell(cell) => Some(cell),
        PanelSlot::Center(_) => None,
    }
}

fn natural_width(cell: &PanelCell, measure: &impl Fn(&PanelCell) -> u32) -> u32 {
    if cell.is_spacer() { 0 } else { measure(cell) }
}

fn layout_segment(
    cells: &[&PanelCell],
    origin: u32,
    width: u32,
    measure: &impl Fn(&PanelCell) -> u32,
    out: &mut Vec<PanelPlacement>,
) {
    let widths: Vec<u32> = cells.iter().map(|cell| natural_width(cell, measure)).collect();
    let fixed: u32 = widths.iter().sum();
    let spacers = cells.iter().filter(|cell| cell.is_spacer()).count();

    let remaining = width.saturating_sub(fixed);
    let (share, last_share) = match u32::try_from(spacers) {
        Ok(count) if count > 0 => {
            let share = remaining / count;
            (share, remaining - share * (count - 1))
        }
        _ => (0, 0),
    };

    let mut x = origin;
    let mut seen = 0;
    for (cell, natural) in cells.iter().zip(widths) {
        let width = if cell.is_spacer() {
            seen += 1;
            if seen == spacers { last_share } else { share }
        } else {
            natural
        };
        out.push(PanelPlacement { cell: (*cell).clone(), x, width });
        x += width;
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Fixed-pitch text measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    pub glyph_width: u32,
    pub padding: u32,
}

impl Default for TextMetrics {
    fn default() -> Self { Self { glyph_width: 7, padding: 8 } }
}

impl TextMetrics {
    /// Width of `text` plus padding.
    #[must_use]
    pub fn text_width(&self, text: &str) -> u32 {
        let chars = u32::try_from(text.chars().count()).unwrap_or(u32::MAX);
        chars.saturating_mul(self.glyph_width).saturating_add(self.padding)
    }

    /// Natural width of a cell.
    ///
    /// View buttons show the view name (or only the icon glyph), the
    /// separator uses the configured separator string, and the title and
    /// keychain use the supplied texts. The tray is given a fixed square.
    #[must_use]
    pub fn cell_width(
        &self,
        model: &ConfigModel,
        cell: &PanelCell,
        title: &str,
        keychain: &str,
    ) -> u32 {
        match cell {
            PanelCell::ViewButton(id) => {
                let view = model.view(*id);
                match (view.icon(), view.is_icon_only()) {
                    (Some(_), true) => self.text_width("#"),
                    (Some(_), false) => self.text_width(view.name()) + self.glyph_width,
                    (None, _) => self.text_width(view.name()),
                }
            }
            PanelCell::Title => self.text_width(title),
            PanelCell::Keychain if keychain.is_empty() => 0,
            PanelCell::Keychain => self.text_width(keychain),
            PanelCell::Sublet(name) => self.text_width(name),
            PanelCell::Separator => self.text_width(&model.options().separator),
            PanelCell::Tray => model.options().panel_height,
            PanelCell::Spacer => 0,
        }
    }
}
