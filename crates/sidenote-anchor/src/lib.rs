#![forbid(unsafe_code)]

//! Text-range highlighting and range geometry for Sidenote.
//!
//! This crate owns the DOM-facing half of the annotation client:
//! - [`Document`] - an arena-backed document tree implementing the small
//!   capability set highlighting needs (enumerate text nodes, split/merge
//!   text, wrap a clipped range, dispatch pointer events); a host adapter
//!   provides the same surface over a real browser DOM
//! - [`DomRange`] / [`Boundary`] - boundary-point ranges over document text
//! - [`Highlight`] - wraps the non-whitespace text in a range with marker
//!   elements, supports nesting, and removes itself without leaving a trace
//! - [`bounding_boxes_for_range`] and [`Selection`] - map text ranges and
//!   selections to document-coordinate rectangles for positioning UI
//!
//! # Example
//! ```
//! use sidenote_anchor::{Boundary, Document, DomRange, Highlight, HighlightOptions};
//!
//! let mut doc = Document::new();
//! let text = doc.create_text("one fine day");
//! let root = doc.root();
//! doc.append_child(root, text);
//!
//! let range = DomRange::new(Boundary::new(text, 4), Boundary::new(text, 8));
//! let highlight = Highlight::create(&mut doc, &range, &HighlightOptions::default());
//! assert_eq!(
//!     doc.inner_html(root),
//!     "one <span class=\"highlight\">fine</span> day"
//! );
//!
//! highlight.remove(&mut doc);
//! assert_eq!(doc.inner_html(root), "one fine day");
//! ```

pub mod dom;
pub mod geometry;
pub mod highlight;
pub mod range;
pub mod selection;

pub use dom::{Document, EventKind, Listener, NodeId};
pub use geometry::{
    MonospaceMeasurer, Rect, TextMeasurer, Viewport, bounding_boxes_for_range,
};
pub use highlight::{Highlight, HighlightOptions};
pub use range::{Boundary, DomRange, compare_boundaries, text_nodes_in_range};
pub use selection::Selection;
