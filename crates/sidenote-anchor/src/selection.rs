//! Selection utilities.
//!
//! A [`Selection`] is the anchor/focus pair a host exposes for the user's
//! current text selection. The anchor is where the selection started, the
//! focus where it currently ends; when the user drags leftwards or upwards
//! the focus precedes the anchor in document order and the selection is
//! "backwards".

use crate::dom::Document;
use crate::geometry::{Rect, TextMeasurer, Viewport, bounding_boxes_for_range};
use crate::range::{Boundary, DomRange, compare_boundaries};

/// A user text selection: anchor and focus boundary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Boundary,
    pub focus: Boundary,
}

impl Selection {
    #[must_use]
    pub fn new(anchor: Boundary, focus: Boundary) -> Self {
        Self { anchor, focus }
    }

    /// Whether the selection is empty.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    /// The selection's range, with boundaries in document order.
    #[must_use]
    pub fn range(&self, doc: &Document) -> DomRange {
        if compare_boundaries(doc, &self.focus, &self.anchor).is_lt() {
            DomRange::new(self.focus, self.anchor)
        } else {
            DomRange::new(self.anchor, self.focus)
        }
    }

    /// True iff the focus point precedes the anchor point in document
    /// order.
    ///
    /// When focus and anchor share a node only the offsets are compared;
    /// otherwise the selection's range decides (the selection is backwards
    /// iff its range starts at the focus).
    #[must_use]
    pub fn is_backwards(&self, doc: &Document) -> bool {
        if self.focus.node == self.anchor.node {
            return self.focus.offset < self.anchor.offset;
        }
        self.range(doc).start.node == self.focus.node
    }

    /// The rectangle of the line of text containing the focus point, in
    /// document coordinates.
    ///
    /// `None` if the selection is collapsed or covers no text boxes. For a
    /// backwards selection the focus sits at the first box, otherwise at
    /// the last.
    #[must_use]
    pub fn focus_rect(
        &self,
        doc: &Document,
        measurer: &dyn TextMeasurer,
        viewport: &Viewport,
    ) -> Option<Rect> {
        if self.is_collapsed() {
            return None;
        }
        let boxes = bounding_boxes_for_range(doc, &self.range(doc), measurer, viewport);
        if self.is_backwards(doc) {
            boxes.first().copied()
        } else {
            boxes.last().copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeId;
    use crate::geometry::MonospaceMeasurer;

    fn doc_with_two_texts() -> (Document, NodeId, NodeId) {
        let mut doc = Document::new();
        let a = doc.create_text("one ");
        let b = doc.create_text("two");
        let root = doc.root();
        doc.append_child(root, a);
        doc.append_child(root, b);
        (doc, a, b)
    }

    #[test]
    fn forward_selection_is_not_backwards() {
        let (doc, a, b) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(a, 0), Boundary::new(b, 2));
        assert!(!sel.is_backwards(&doc));
    }

    #[test]
    fn reversed_selection_is_backwards() {
        let (doc, a, b) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(b, 2), Boundary::new(a, 0));
        assert!(sel.is_backwards(&doc));
    }

    #[test]
    fn same_node_selection_compares_offsets() {
        let (doc, a, _) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(a, 3), Boundary::new(a, 1));
        assert!(sel.is_backwards(&doc));
        let sel = Selection::new(Boundary::new(a, 1), Boundary::new(a, 3));
        assert!(!sel.is_backwards(&doc));
    }

    #[test]
    fn collapsed_selection_has_no_focus_rect() {
        let (doc, a, _) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(a, 1), Boundary::new(a, 1));
        assert!(sel.is_collapsed());
        let rect = sel.focus_rect(&doc, &MonospaceMeasurer::default(), &Viewport::default());
        assert!(rect.is_none());
    }

    #[test]
    fn focus_rect_is_last_box_for_forward_selection() {
        let (doc, a, b) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(a, 0), Boundary::new(b, 3));
        let rect = sel
            .focus_rect(&doc, &MonospaceMeasurer::default(), &Viewport::default())
            .unwrap();
        // The box for "two", which starts after the four cells of "one ".
        assert_eq!(rect, Rect::new(32.0, 0.0, 24.0, 16.0));
    }

    #[test]
    fn focus_rect_is_first_box_for_backward_selection() {
        let (doc, a, b) = doc_with_two_texts();
        let sel = Selection::new(Boundary::new(b, 3), Boundary::new(a, 0));
        let rect = sel
            .focus_rect(&doc, &MonospaceMeasurer::default(), &Viewport::default())
            .unwrap();
        assert_eq!(rect, Rect::new(0.0, 0.0, 32.0, 16.0));
    }

    #[test]
    fn whitespace_only_selection_has_no_focus_rect() {
        let mut doc = Document::new();
        let text = doc.create_text("   ");
        let root = doc.root();
        doc.append_child(root, text);
        let sel = Selection::new(Boundary::new(text, 0), Boundary::new(text, 3));
        let rect = sel.focus_rect(&doc, &MonospaceMeasurer::default(), &Viewport::default());
        assert!(rect.is_none());
    }
}
