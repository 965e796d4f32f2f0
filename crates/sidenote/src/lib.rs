#![forbid(unsafe_code)]

//! Sidenote public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. It
//! re-exports common types from the internal crates and offers a
//! lightweight prelude for day-to-day usage.

// --- Thread re-exports -----------------------------------------------------

pub use sidenote_thread::{Annotation, BuildOptions, SortOrder, Thread, build_thread};

// --- Anchor re-exports -----------------------------------------------------

pub use sidenote_anchor::{
    Boundary, Document, DomRange, EventKind, Highlight, HighlightOptions, MonospaceMeasurer,
    NodeId, Rect, Selection, TextMeasurer, Viewport,
};

// --- Extension re-exports --------------------------------------------------

pub use sidenote_extension::{
    Activation, Blocklist, Decision, Extension, HelpTopic, InjectionError, Settings,
    SidebarInjector, Tab, TabId, TabState, TabStateStore, TabStore,
};

// --- Prelude ---------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Annotation, BuildOptions, Document, DomRange, Highlight, HighlightOptions, NodeId,
        Selection, SortOrder, Tab, TabState, TabStateStore, Thread, build_thread,
    };

    pub use crate::{anchor, extension, thread};
}

pub use sidenote_anchor as anchor;
pub use sidenote_extension as extension;
pub use sidenote_thread as thread;
