//! Out-of-view indicators and popup placement.
//!
//! The engine owns the counting and placement math; measurement belongs to
//! whatever renders the document, behind [`GeometryProvider`]. A terminal
//! viewer measures in rows, a browser-like host in pixels; both are just
//! `f64` to the math here.

use crate::document::Document;
use crate::span::Span;

/// Axis-aligned box in the provider's coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Currently visible vertical slice of the document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub bottom: f64,
}

/// Measurement interface a renderer implements for the indicator math.
pub trait GeometryProvider {
    fn viewport(&self) -> Viewport;

    /// Bounding box of one span's rendered extent, or `None` when it has no
    /// geometry (detached, collapsed away by the renderer).
    fn span_rect(&self, doc: &Document, span: &Span) -> Option<Rect>;
}

/// How many spans sit entirely off-screen in each direction, and which span
/// a jump should target: the nearest one above and below the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndicatorState {
    pub above: usize,
    pub below: usize,
    /// Index into the document's span set of the closest span above.
    pub nearest_above: Option<usize>,
    pub nearest_below: Option<usize>,
}

impl IndicatorState {
    /// Count spans fully above/below the viewport. A span is "above" when
    /// its whole box ends before the viewport starts; partially visible
    /// spans count as visible.
    pub fn compute(doc: &Document, geometry: &impl GeometryProvider) -> Self {
        let viewport = geometry.viewport();
        let mut state = Self::default();
        for (i, span) in doc.spans().iter().enumerate() {
            let Some(rect) = geometry.span_rect(doc, span) else {
                continue;
            };
            if rect.bottom < viewport.top {
                state.above += 1;
                // Spans are in document order, so the last one above is the
                // nearest.
                state.nearest_above = Some(i);
            } else if rect.top > viewport.bottom {
                state.below += 1;
                if state.nearest_below.is_none() {
                    state.nearest_below = Some(i);
                }
            }
        }
        state
    }
}

/// Top-left corner for a popup anchored to a selection box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupPlacement {
    pub x: f64,
    pub y: f64,
    /// True when the popup had to flip below the anchor to stay on screen.
    pub flipped: bool,
}

const POPUP_GAP: f64 = 4.0;

/// Place a popup of the given size above the anchor, horizontally centered,
/// clamped to `[0, host_width]`; flip below the anchor when there is no room
/// above the viewport top.
pub fn popup_placement(
    anchor: Rect,
    viewport: Viewport,
    host_width: f64,
    popup_width: f64,
    popup_height: f64,
) -> PopupPlacement {
    let mid = (anchor.left + anchor.right) / 2.0;
    let x = (mid - popup_width / 2.0).clamp(0.0, (host_width - popup_width).max(0.0));

    let above = anchor.top - POPUP_GAP - popup_height;
    if above >= viewport.top {
        PopupPlacement { x, y: above, flipped: false }
    } else {
        PopupPlacement {
            x,
            y: anchor.bottom + POPUP_GAP,
            flipped: true,
        }
    }
}
