//! Ranges over document text.
//!
//! A [`DomRange`] is a pair of boundary points. A boundary addresses either
//! a character position inside a text node or a slot between an element's
//! children, exactly like DOM `Range` boundaries. Comparisons are performed
//! in document order via child-index paths from the root.

use crate::dom::{Document, NodeId, char_slice};

/// A boundary point: a node plus an offset.
///
/// For text nodes the offset is a character offset; for elements it is a
/// child index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boundary {
    pub node: NodeId,
    pub offset: usize,
}

impl Boundary {
    #[must_use]
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }

    /// Sort key in document order: the node's path plus the offset.
    fn key(&self, doc: &Document) -> Vec<usize> {
        let mut key = doc.path(self.node);
        key.push(self.offset);
        key
    }
}

/// Compare two boundary points in document order.
#[must_use]
pub fn compare_boundaries(doc: &Document, a: &Boundary, b: &Boundary) -> std::cmp::Ordering {
    if a.node == b.node {
        return a.offset.cmp(&b.offset);
    }
    a.key(doc).cmp(&b.key(doc))
}

/// A contiguous region of the document between two boundary points.
///
/// `start` must not come after `end`; constructors uphold this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: Boundary,
    pub end: Boundary,
}

impl DomRange {
    /// Range between two boundaries, ordered by the caller.
    #[must_use]
    pub fn new(start: Boundary, end: Boundary) -> Self {
        Self { start, end }
    }

    /// Range spanning `node` itself within its parent.
    #[must_use]
    pub fn select_node(doc: &Document, node: NodeId) -> Self {
        let parent = doc.parent(node).expect("select_node on a detached node");
        let index = doc
            .children(parent)
            .iter()
            .position(|&c| c == node)
            .unwrap_or(0);
        Self {
            start: Boundary::new(parent, index),
            end: Boundary::new(parent, index + 1),
        }
    }

    /// Range spanning the contents of `node`.
    #[must_use]
    pub fn select_node_contents(doc: &Document, node: NodeId) -> Self {
        Self {
            start: Boundary::new(node, 0),
            end: Boundary::new(node, doc.length(node)),
        }
    }

    /// Move the start boundary.
    pub fn set_start(&mut self, node: NodeId, offset: usize) {
        self.start = Boundary::new(node, offset);
    }

    /// Move the end boundary.
    pub fn set_end(&mut self, node: NodeId, offset: usize) {
        self.end = Boundary::new(node, offset);
    }

    /// Whether the boundaries coincide.
    #[must_use]
    pub fn is_collapsed(&self, doc: &Document) -> bool {
        compare_boundaries(doc, &self.start, &self.end).is_eq()
    }

    /// Whether `node` lies within the range: it is a boundary container, or
    /// its full extent falls between the boundary points.
    #[must_use]
    pub fn contains_node(&self, doc: &Document, node: NodeId) -> bool {
        if node == self.start.node || node == self.end.node {
            return true;
        }
        if doc.parent(node).is_none() {
            return false;
        }
        let node_range = DomRange::select_node(doc, node);
        compare_boundaries(doc, &self.start, &node_range.start).is_le()
            && compare_boundaries(doc, &self.end, &node_range.end).is_ge()
    }

    /// Character bounds of this range's intersection with a text node.
    ///
    /// The start offset is clipped if the node is the range's start
    /// container, the end offset if it is the end container; otherwise the
    /// node's full extent is used.
    #[must_use]
    pub fn clip_to_text_node(&self, doc: &Document, node: NodeId) -> (usize, usize) {
        let mut start = 0;
        let mut end = doc.length(node);
        if node == self.start.node {
            start = self.start.offset.min(end);
        }
        if node == self.end.node {
            end = self.end.offset.min(end);
        }
        (start, end.max(start))
    }

    /// The text contained in the range, concatenated in document order.
    #[must_use]
    pub fn text(&self, doc: &Document) -> String {
        let mut out = String::new();
        for node in doc.descendants(doc.root()) {
            if !doc.is_text(node) || !self.contains_node(doc, node) {
                continue;
            }
            let (start, end) = self.clip_to_text_node(doc, node);
            if let Some(text) = doc.text(node) {
                out.push_str(char_slice(text, start, end));
            }
        }
        out
    }
}

/// Text nodes intersecting `range` in document order, excluding nodes whose
/// entire text is whitespace.
#[must_use]
pub fn text_nodes_in_range(doc: &Document, range: &DomRange) -> Vec<NodeId> {
    doc.descendants(doc.root())
        .into_iter()
        .filter(|&node| {
            doc.is_text(node)
                && doc
                    .text(node)
                    .is_some_and(|t| !t.chars().all(char::is_whitespace))
                && range.contains_node(doc, node)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<body><p>{one} {two}</p><p>{three}</p></body>` with the text nodes
    /// returned in order.
    fn fixture() -> (Document, Vec<NodeId>) {
        let mut doc = Document::new();
        let p1 = doc.create_element("p");
        let one = doc.create_text("one ");
        let two = doc.create_text("two");
        doc.append_child(p1, one);
        doc.append_child(p1, two);
        let p2 = doc.create_element("p");
        let three = doc.create_text("three");
        doc.append_child(p2, three);
        let root = doc.root();
        doc.append_child(root, p1);
        doc.append_child(root, p2);
        (doc, vec![one, two, three])
    }

    #[test]
    fn boundaries_compare_in_document_order() {
        let (doc, nodes) = fixture();
        let a = Boundary::new(nodes[0], 2);
        let b = Boundary::new(nodes[1], 0);
        let c = Boundary::new(nodes[2], 1);
        assert!(compare_boundaries(&doc, &a, &b).is_lt());
        assert!(compare_boundaries(&doc, &b, &c).is_lt());
        assert!(compare_boundaries(&doc, &c, &a).is_gt());
    }

    #[test]
    fn same_node_boundaries_compare_by_offset() {
        let (doc, nodes) = fixture();
        let a = Boundary::new(nodes[0], 1);
        let b = Boundary::new(nodes[0], 3);
        assert!(compare_boundaries(&doc, &a, &b).is_lt());
        assert!(compare_boundaries(&doc, &a, &a).is_eq());
    }

    #[test]
    fn element_boundary_brackets_descendants() {
        let (doc, nodes) = fixture();
        let root = doc.root();
        // Between the two paragraphs.
        let between = Boundary::new(root, 1);
        let in_first = Boundary::new(nodes[1], 1);
        let in_second = Boundary::new(nodes[2], 0);
        assert!(compare_boundaries(&doc, &in_first, &between).is_lt());
        assert!(compare_boundaries(&doc, &between, &in_second).is_lt());
    }

    #[test]
    fn contains_node_includes_boundary_containers() {
        let (doc, nodes) = fixture();
        let range = DomRange::new(Boundary::new(nodes[0], 2), Boundary::new(nodes[2], 1));
        assert!(range.contains_node(&doc, nodes[0]));
        assert!(range.contains_node(&doc, nodes[1]));
        assert!(range.contains_node(&doc, nodes[2]));
    }

    #[test]
    fn contains_node_excludes_nodes_outside() {
        let (doc, nodes) = fixture();
        let range = DomRange::new(Boundary::new(nodes[0], 0), Boundary::new(nodes[0], 3));
        assert!(!range.contains_node(&doc, nodes[2]));
    }

    #[test]
    fn clip_limits_offsets_to_boundary_containers() {
        let (doc, nodes) = fixture();
        let range = DomRange::new(Boundary::new(nodes[0], 2), Boundary::new(nodes[2], 3));
        assert_eq!(range.clip_to_text_node(&doc, nodes[0]), (2, 4));
        assert_eq!(range.clip_to_text_node(&doc, nodes[1]), (0, 3));
        assert_eq!(range.clip_to_text_node(&doc, nodes[2]), (0, 3));
    }

    #[test]
    fn range_text_concatenates_clipped_nodes() {
        let (doc, nodes) = fixture();
        let range = DomRange::new(Boundary::new(nodes[0], 2), Boundary::new(nodes[2], 3));
        assert_eq!(range.text(&doc), "e twothr");
    }

    #[test]
    fn text_nodes_in_range_skips_whitespace_only_nodes() {
        let mut doc = Document::new();
        let a = doc.create_text("one");
        let ws = doc.create_text("   ");
        let b = doc.create_text("two");
        let root = doc.root();
        doc.append_child(root, a);
        doc.append_child(root, ws);
        doc.append_child(root, b);
        let range = DomRange::select_node_contents(&doc, root);
        assert_eq!(text_nodes_in_range(&doc, &range), vec![a, b]);
    }

    #[test]
    fn collapsed_range_has_no_text() {
        let (doc, nodes) = fixture();
        let range = DomRange::new(Boundary::new(nodes[1], 1), Boundary::new(nodes[1], 1));
        assert!(range.is_collapsed(&doc));
        assert_eq!(range.text(&doc), "");
    }
}
