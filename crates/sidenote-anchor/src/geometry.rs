//! Mapping text ranges to document-coordinate rectangles.
//!
//! Layout is host territory: a [`TextMeasurer`] adapter reports
//! viewport-coordinate client rectangles for a clipped run of a text node,
//! and the functions here translate them into document coordinates using
//! the viewport's scroll offsets. Tests use the deterministic
//! [`MonospaceMeasurer`].

use crate::dom::{Document, NodeId};
use crate::range::{DomRange, text_nodes_in_range};

/// An axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The rectangle shifted by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            left: self.left + dx,
            top: self.top + dy,
            ..*self
        }
    }
}

/// Scroll state of the viewing window.
///
/// Hosts historically expose the scroll offsets under two accessor names;
/// [`Viewport::scroll_offsets`] prefers the page-offset pair and falls back
/// to the scroll-position pair, so either is sufficient.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewport {
    /// `pageXOffset`/`pageYOffset`-style accessors.
    pub page_offset: Option<(f64, f64)>,
    /// `scrollX`/`scrollY`-style accessors.
    pub scroll_position: Option<(f64, f64)>,
}

impl Viewport {
    /// Viewport scrolled by the page-offset accessor pair.
    #[must_use]
    pub fn from_page_offset(x: f64, y: f64) -> Self {
        Self {
            page_offset: Some((x, y)),
            scroll_position: None,
        }
    }

    /// Viewport that only exposes the legacy scroll-position pair.
    #[must_use]
    pub fn from_scroll_position(x: f64, y: f64) -> Self {
        Self {
            page_offset: None,
            scroll_position: Some((x, y)),
        }
    }

    /// Current scroll offsets, trying both accessor conventions.
    #[must_use]
    pub fn scroll_offsets(&self) -> (f64, f64) {
        self.page_offset
            .or(self.scroll_position)
            .unwrap_or((0.0, 0.0))
    }
}

/// Host layout adapter: viewport-coordinate rectangles for characters
/// `[start, end)` of a text node.
pub trait TextMeasurer {
    fn client_rects(&self, doc: &Document, node: NodeId, start: usize, end: usize) -> Vec<Rect>;
}

/// Bounding rectangles for the text in `range`, in document coordinates.
///
/// Each qualifying text node is clipped to the range; collapsed clips are
/// skipped, the rest are measured and translated from viewport to document
/// coordinates by adding the scroll offsets.
#[must_use]
pub fn bounding_boxes_for_range(
    doc: &Document,
    range: &DomRange,
    measurer: &dyn TextMeasurer,
    viewport: &Viewport,
) -> Vec<Rect> {
    let (scroll_x, scroll_y) = viewport.scroll_offsets();
    let mut rects = Vec::new();
    for node in text_nodes_in_range(doc, range) {
        let (start, end) = range.clip_to_text_node(doc, node);
        if start == end {
            // The range ends at the start of this node or starts at its
            // end.
            continue;
        }
        for rect in measurer.client_rects(doc, node, start, end) {
            rects.push(rect.translate(scroll_x, scroll_y));
        }
    }
    rects
}

/// Deterministic single-line layout: every character occupies a fixed-width
/// cell on one line, in document text order. Intended for tests and
/// headless use.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceMeasurer {
    pub char_width: f64,
    pub line_height: f64,
}

impl Default for MonospaceMeasurer {
    fn default() -> Self {
        Self {
            char_width: 8.0,
            line_height: 16.0,
        }
    }
}

impl MonospaceMeasurer {
    /// Character offset of a text node's first character within the
    /// document's concatenated text.
    fn global_offset(&self, doc: &Document, node: NodeId) -> usize {
        let mut offset = 0;
        for candidate in doc.descendants(doc.root()) {
            if candidate == node {
                break;
            }
            if doc.is_text(candidate) {
                offset += doc.length(candidate);
            }
        }
        offset
    }
}

impl TextMeasurer for MonospaceMeasurer {
    fn client_rects(&self, doc: &Document, node: NodeId, start: usize, end: usize) -> Vec<Rect> {
        if start >= end {
            return Vec::new();
        }
        let base = self.global_offset(doc, node);
        vec![Rect::new(
            (base + start) as f64 * self.char_width,
            0.0,
            (end - start) as f64 * self.char_width,
            self.line_height,
        )]
    }
}
