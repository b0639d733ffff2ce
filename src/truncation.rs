//! Height budgeting for the inline menu when the anchor sits near the bottom
//! of the page content.
//!
//! When the room between the anchor and the bottom of the content container is
//! tight, the embedded menu is told to cap its own height and scroll
//! internally. The budget is delivered as a render-time hint; a `None` result
//! means the menu may use its natural height.

use crate::geometry::Rect;

/// Below this much free space the menu renders in truncated mode.
const TRUNCATION_THRESHOLD: f64 = 300.0;

/// Very tight spaces get extra headroom so a minimal usable menu still fits.
const TIGHT_SPACE: f64 = 100.0;
const TIGHT_HEADROOM: f64 = 80.0;

/// Decide whether the inline menu must render height-constrained.
///
/// `anchor` is the form field's rectangle, `container` the page content
/// container (typically the document body). Returns the pixel budget for the
/// menu, or `None` when the menu can render at natural height.
pub fn estimate_truncated_height(anchor: Rect, container: Rect) -> Option<f64> {
    let space = container.bottom - anchor.bottom;

    if space < 0.0 || space >= TRUNCATION_THRESHOLD {
        return None;
    }

    if space < TIGHT_SPACE {
        Some(space + TIGHT_HEADROOM)
    } else {
        Some(space)
    }
}
