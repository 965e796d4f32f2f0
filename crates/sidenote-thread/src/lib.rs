#![forbid(unsafe_code)]

//! Annotation reply threading for Sidenote.
//!
//! This crate turns the flat list of annotations returned by the API into
//! the reply tree displayed in the sidebar:
//! - [`Annotation`] - the API entity, identified by a server id or a
//!   client-session tag until the server confirms it
//! - [`build_thread`] - pure projection of a flat annotation list into a
//!   [`Thread`] tree, applying selection, search filtering, expansion state
//!   and sorting
//! - [`SortOrder`] - strict less-than comparators used for sibling ordering
//!
//! Threading tolerates dirty input: references to annotations that are not
//! loaded, duplicated ids, and reference cycles all resolve to a forest.
//!
//! # Example
//! ```
//! use sidenote_thread::{build_thread, Annotation, BuildOptions, SortOrder};
//!
//! let annotations = vec![
//!     Annotation::new("t1").with_id("a1").updated_at(10),
//!     Annotation::new("t2").with_id("a2").replying_to(["a1"]).updated_at(20),
//! ];
//! let root = build_thread(&annotations, &BuildOptions::new().sort_by(SortOrder::Oldest));
//! assert_eq!(root.children.len(), 1);
//! assert_eq!(root.children[0].reply_count, 1);
//! ```

pub mod annotation;
pub mod builder;
pub mod sort;

pub use annotation::Annotation;
pub use builder::{BuildOptions, Thread, build_thread};
pub use sort::SortOrder;
