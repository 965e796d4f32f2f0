//! Visual marking of text ranges.
//!
//! A [`Highlight`] wraps every non-whitespace run of text inside a range in
//! a `span` wrapper element. Wrappers are the only DOM mutation the engine
//! performs, and [`Highlight::remove`] reverses it exactly: children move
//! back to the parent, the wrapper is deleted and the surrounding text nodes
//! are re-merged, restoring the pre-highlight text-node structure.
//!
//! Highlights nest: wrapping text that already sits inside another wrapper
//! splits only the inner text node, so the outer wrapper stays a valid
//! ancestor of the new one.

use tracing::trace;

use crate::dom::{Document, EventKind, Listener, NodeId, char_slice};
use crate::range::{DomRange, text_nodes_in_range};

/// Display options and event callbacks for a highlight.
///
/// Every wrapper element created for the highlight gets the class and the
/// listeners.
#[derive(Default)]
pub struct HighlightOptions {
    /// CSS class applied to each wrapper. Empty means the default,
    /// `"highlight"`.
    pub class_name: String,
    pub on_click: Option<Listener>,
    pub on_mouse_enter: Option<Listener>,
    pub on_mouse_leave: Option<Listener>,
}

impl std::fmt::Debug for HighlightOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightOptions")
            .field("class_name", &self.class_name)
            .field("on_click", &self.on_click.is_some())
            .field("on_mouse_enter", &self.on_mouse_enter.is_some())
            .field("on_mouse_leave", &self.on_mouse_leave.is_some())
            .finish()
    }
}

const DEFAULT_CLASS: &str = "highlight";

impl HighlightOptions {
    fn class(&self) -> &str {
        if self.class_name.is_empty() {
            DEFAULT_CLASS
        } else {
            &self.class_name
        }
    }
}

/// A highlight over the text within a range.
///
/// Clients should not manipulate the wrapper elements directly; the only
/// handle exposed is [`Highlight::node`], for scrolling a highlight into
/// view.
#[derive(Debug)]
pub struct Highlight {
    wrappers: Vec<NodeId>,
}

impl Highlight {
    /// Wrap the non-whitespace text in `range` and attach the options'
    /// class and listeners to every wrapper.
    ///
    /// An empty or whitespace-only range produces an empty highlight; no
    /// wrappers are created and the document is left untouched.
    #[must_use]
    pub fn create(doc: &mut Document, range: &DomRange, opts: &HighlightOptions) -> Self {
        let wrappers = wrap_text_in_range(doc, range);
        for &wrapper in &wrappers {
            doc.set_class_name(wrapper, opts.class());
            if let Some(listener) = &opts.on_click {
                doc.add_event_listener(wrapper, EventKind::Click, listener.clone());
            }
            if let Some(listener) = &opts.on_mouse_enter {
                doc.add_event_listener(wrapper, EventKind::MouseEnter, listener.clone());
            }
            if let Some(listener) = &opts.on_mouse_leave {
                doc.add_event_listener(wrapper, EventKind::MouseLeave, listener.clone());
            }
        }
        trace!(wrappers = wrappers.len(), "highlight created");
        Self { wrappers }
    }

    /// True iff no wrapper elements were created.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    /// The first wrapper element, used to scroll the highlight into view.
    #[must_use]
    pub fn node(&self) -> Option<NodeId> {
        self.wrappers.first().copied()
    }

    /// Toggle a class on every wrapper.
    pub fn set_class(&self, doc: &mut Document, class: &str, on: bool) {
        for &wrapper in &self.wrappers {
            doc.set_class(wrapper, class, on);
        }
    }

    /// Remove the highlight, restoring the document to its pre-highlight
    /// text-node structure.
    pub fn remove(&self, doc: &mut Document) {
        for &wrapper in &self.wrappers {
            doc.unwrap(wrapper);
        }
    }
}

/// Wrap the intersection of `range` with each of its text nodes in a new
/// `span` element. Whitespace-only intersections are skipped. Returns the
/// wrappers in document order.
fn wrap_text_in_range(doc: &mut Document, range: &DomRange) -> Vec<NodeId> {
    // Collect nodes and clip bounds before mutating; arena handles stay
    // valid across the splits below.
    let clipped: Vec<(NodeId, usize, usize)> = text_nodes_in_range(doc, range)
        .into_iter()
        .map(|node| {
            let (start, end) = range.clip_to_text_node(doc, node);
            (node, start, end)
        })
        .collect();

    let mut wrappers = Vec::new();
    for (node, start, end) in clipped {
        let text = doc.text(node).unwrap_or_default();
        if char_slice(text, start, end)
            .chars()
            .all(char::is_whitespace)
        {
            continue;
        }
        wrappers.push(doc.surround_text(node, start, end, "span"));
    }
    wrappers
}
