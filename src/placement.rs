//! Viewport-aware placement for the inline field menu.
//!
//! The overlay prefers to sit directly under the anchor field. When it would
//! overflow the bottom of the viewport it flips above the anchor, and when
//! neither side has room it picks whichever side has strictly more remaining
//! space and accepts the clipping. The heuristic is greedy and non-iterative:
//! the chosen fallback is not re-checked for fit.

use crate::geometry::{Position, Rect, Size};

/// Compute the overlay's top/left position relative to an anchor rectangle.
///
/// # Arguments
/// * `anchor` - bounding rectangle of the form field the overlay attaches to
/// * `overlay` - current rendered size of the overlay
/// * `viewport` - visible viewport size
pub fn compute_position(anchor: Rect, overlay: Size, viewport: Size) -> Position {
    let mut top = anchor.bottom;
    let mut left = anchor.left;

    // Clamp right edge
    if left + overlay.width > viewport.width {
        left = (viewport.width - overlay.width).max(0.0);
    }

    // If the overlay overflows the bottom, show above the anchor instead
    if top + overlay.height > viewport.height {
        let above = anchor.top - overlay.height;
        if above >= 0.0 {
            top = above;
        } else {
            // No room on either side: prefer the side with strictly more
            // remaining space, below winning ties. Clipping is accepted.
            let space_above = anchor.top;
            let space_below = viewport.height - anchor.bottom;
            top = if space_above > space_below {
                (anchor.top - overlay.height).max(0.0)
            } else {
                anchor.bottom
            };
        }
    }

    Position { top, left }
}
