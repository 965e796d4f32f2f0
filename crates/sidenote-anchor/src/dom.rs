//! Arena-backed document tree.
//!
//! [`Document`] implements the small capability set the highlighting engine
//! needs from a host document: enumerate text nodes, split and merge text,
//! wrap a clipped range in an element, and dispatch pointer events to
//! listeners. Nodes live in an arena and are addressed by [`NodeId`] index
//! handles; handles stay valid across tree mutations, so code can collect
//! nodes first and mutate afterwards.
//!
//! Text offsets are always character offsets, not byte offsets.

use std::fmt;
use std::rc::Rc;

/// Index handle for a node in a [`Document`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Pointer events a document can dispatch to element listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Click,
    MouseEnter,
    MouseLeave,
}

/// Event callback attached to an element. Receives the element it fired on.
pub type Listener = Rc<dyn Fn(NodeId)>;

struct ElementData {
    tag: String,
    classes: Vec<String>,
    children: Vec<NodeId>,
    listeners: Vec<(EventKind, Listener)>,
}

enum NodeKind {
    Element(ElementData),
    Text(String),
}

struct NodeData {
    parent: Option<NodeId>,
    kind: NodeKind,
}

/// An in-memory document tree.
///
/// Detached nodes stay in the arena (their handles remain valid) but are
/// unreachable from the root and are skipped by traversal.
pub struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.nodes.len())
            .field("html", &self.to_html(self.root))
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with an empty `body` root element.
    #[must_use]
    pub fn new() -> Self {
        let root_data = NodeData {
            parent: None,
            kind: NodeKind::Element(ElementData {
                tag: "body".to_owned(),
                classes: Vec::new(),
                children: Vec::new(),
                listeners: Vec::new(),
            }),
        };
        Self {
            nodes: vec![root_data],
            root: NodeId(0),
        }
    }

    /// The root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    // ── Construction ────────────────────────────────────────────────────

    /// Create a detached element node.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(NodeKind::Element(ElementData {
            tag: tag.into(),
            classes: Vec::new(),
            children: Vec::new(),
            listeners: Vec::new(),
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData { parent: None, kind });
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// Detaches `child` from its current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.element_mut(parent).children.push(child);
    }

    /// Insert `new` as a child of `parent`, immediately before `reference`.
    ///
    /// With `reference` of `None` this appends.
    pub fn insert_before(&mut self, parent: NodeId, new: NodeId, reference: Option<NodeId>) {
        self.detach(new);
        self.nodes[new.0].parent = Some(parent);
        let children = &mut self.element_mut(parent).children;
        match reference.and_then(|r| children.iter().position(|&c| c == r)) {
            Some(pos) => children.insert(pos, new),
            None => children.push(new),
        }
    }

    /// Remove a node from its parent's child list. The node (and its
    /// subtree) stays in the arena and can be re-inserted.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(parent) = self.nodes[node.0].parent.take() {
            self.element_mut(parent).children.retain(|&c| c != node);
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    /// Parent of a node, if attached.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    /// Child list of an element; empty for text nodes.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => &el.children,
            NodeKind::Text(_) => &[],
        }
    }

    /// Whether the node is a text node.
    #[must_use]
    pub fn is_text(&self, node: NodeId) -> bool {
        matches!(self.nodes[node.0].kind, NodeKind::Text(_))
    }

    /// Text of a text node, `None` for elements.
    #[must_use]
    pub fn text(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => Some(text),
            NodeKind::Element(_) => None,
        }
    }

    /// Character length of a text node; child count for elements.
    #[must_use]
    pub fn length(&self, node: NodeId) -> usize {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.chars().count(),
            NodeKind::Element(el) => el.children.len(),
        }
    }

    /// Element tag name, `None` for text nodes.
    #[must_use]
    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => Some(&el.tag),
            NodeKind::Text(_) => None,
        }
    }

    /// Concatenated text of the subtree rooted at `node`.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element(el) => el
                .children
                .iter()
                .map(|&c| self.text_content(c))
                .collect(),
        }
    }

    /// Pre-order traversal of the subtree rooted at `node`, including it.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(node, &mut out);
        out
    }

    fn collect_descendants(&self, node: NodeId, out: &mut Vec<NodeId>) {
        out.push(node);
        for &child in self.children(node) {
            self.collect_descendants(child, out);
        }
    }

    /// Child indices from the root down to `node` (empty for the root).
    ///
    /// Used for document-order comparisons; only meaningful for attached
    /// nodes.
    #[must_use]
    pub fn path(&self, node: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            let index = self
                .children(parent)
                .iter()
                .position(|&c| c == current)
                .unwrap_or(0);
            path.push(index);
            current = parent;
        }
        path.reverse();
        path
    }

    // ── Classes ─────────────────────────────────────────────────────────

    /// Replace the class list with a single class.
    pub fn set_class_name(&mut self, node: NodeId, class: &str) {
        self.element_mut(node).classes = vec![class.to_owned()];
    }

    /// Add or remove a class.
    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) {
        let classes = &mut self.element_mut(node).classes;
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_owned());
        } else if !on && present {
            classes.retain(|c| c != class);
        }
    }

    /// Whether the element carries a class.
    #[must_use]
    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        match &self.nodes[node.0].kind {
            NodeKind::Element(el) => el.classes.iter().any(|c| c == class),
            NodeKind::Text(_) => false,
        }
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Attach an event listener to an element.
    pub fn add_event_listener(&mut self, node: NodeId, kind: EventKind, listener: Listener) {
        self.element_mut(node).listeners.push((kind, listener));
    }

    /// Invoke the listeners for `kind` on `node`. Returns how many fired.
    ///
    /// No capture or bubbling; events target the element directly.
    pub fn dispatch(&self, node: NodeId, kind: EventKind) -> usize {
        let listeners: Vec<Listener> = match &self.nodes[node.0].kind {
            NodeKind::Element(el) => el
                .listeners
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, l)| Rc::clone(l))
                .collect(),
            NodeKind::Text(_) => Vec::new(),
        };
        for listener in &listeners {
            listener(node);
        }
        listeners.len()
    }

    // ── Text surgery ────────────────────────────────────────────────────

    /// Split a text node at a character offset.
    ///
    /// The original node keeps `[0, offset)`; a new sibling holding the rest
    /// is inserted immediately after it and returned. Splitting at 0 or at
    /// the end produces an empty node on the corresponding side, mirroring
    /// `Text.splitText`.
    pub fn split_text(&mut self, node: NodeId, offset: usize) -> NodeId {
        let text = match &self.nodes[node.0].kind {
            NodeKind::Text(text) => text.clone(),
            NodeKind::Element(_) => panic!("split_text on an element node"),
        };
        let byte = char_to_byte(&text, offset);
        let (head, tail) = text.split_at(byte);
        let head = head.to_owned();
        let tail = tail.to_owned();

        if let NodeKind::Text(t) = &mut self.nodes[node.0].kind {
            *t = head;
        }
        let new = self.create_text(tail);
        if let Some(parent) = self.parent(node) {
            let next = self.next_sibling(node);
            self.insert_before(parent, new, next);
        }
        new
    }

    /// The sibling immediately after `node`, if any.
    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.parent(node)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings.get(pos + 1).copied()
    }

    /// Merge adjacent text-node children of `node` and drop empty ones,
    /// mirroring `Node.normalize()`.
    pub fn normalize(&mut self, node: NodeId) {
        let children = self.children(node).to_vec();
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            if self.is_text(child) {
                if self.length(child) == 0 {
                    self.detach(child);
                    continue;
                }
                if let Some(&prev) = merged.last()
                    && self.is_text(prev)
                {
                    let extra = self.text(child).unwrap_or_default().to_owned();
                    if let NodeKind::Text(t) = &mut self.nodes[prev.0].kind {
                        t.push_str(&extra);
                    }
                    self.detach(child);
                    continue;
                }
            }
            merged.push(child);
        }
    }

    /// Wrap characters `[start, end)` of a text node in a new element.
    ///
    /// The text node is split so that exactly the wrapped characters move
    /// inside the wrapper, which takes the text node's place in the parent.
    /// Returns the wrapper.
    pub fn surround_text(
        &mut self,
        node: NodeId,
        start: usize,
        end: usize,
        tag: impl Into<String>,
    ) -> NodeId {
        debug_assert!(start <= end && end <= self.length(node));
        if end < self.length(node) {
            self.split_text(node, end);
        }
        let target = if start > 0 {
            self.split_text(node, start)
        } else {
            node
        };
        let wrapper = self.create_element(tag);
        let parent = self
            .parent(target)
            .expect("surround_text on a detached text node");
        self.insert_before(parent, wrapper, Some(target));
        self.append_child(wrapper, target);
        wrapper
    }

    /// Replace an element with its children and re-merge the surrounding
    /// text, restoring the parent's pre-wrap text-node structure.
    pub fn unwrap(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        let children = self.children(node).to_vec();
        for child in children {
            self.insert_before(parent, child, Some(node));
        }
        self.detach(node);
        self.normalize(parent);
    }

    // ── Serialization ───────────────────────────────────────────────────

    /// Serialize the subtree rooted at `node` as HTML. Used by tests to
    /// assert exact round-trips.
    #[must_use]
    pub fn to_html(&self, node: NodeId) -> String {
        match &self.nodes[node.0].kind {
            NodeKind::Text(text) => escape(text),
            NodeKind::Element(el) => {
                let mut out = String::new();
                out.push('<');
                out.push_str(&el.tag);
                if !el.classes.is_empty() {
                    out.push_str(" class=\"");
                    out.push_str(&el.classes.join(" "));
                    out.push('"');
                }
                out.push('>');
                for &child in &el.children {
                    out.push_str(&self.to_html(child));
                }
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
                out
            }
        }
    }

    /// Serialize the children of `node`, the equivalent of `innerHTML`.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        self.children(node)
            .iter()
            .map(|&c| self.to_html(c))
            .collect()
    }

    fn element_mut(&mut self, node: NodeId) -> &mut ElementData {
        match &mut self.nodes[node.0].kind {
            NodeKind::Element(el) => el,
            NodeKind::Text(_) => panic!("element operation on a text node"),
        }
    }
}

/// Substring of `text` by character offsets.
#[must_use]
pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let from = char_to_byte(text, start);
    let to = char_to_byte(text, end);
    &text[from..to]
}

fn char_to_byte(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map_or(text.len(), |(byte, _)| byte)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
