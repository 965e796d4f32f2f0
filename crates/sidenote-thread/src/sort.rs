//! Sibling ordering for thread trees.

use std::cmp::Ordering;

use crate::annotation::Annotation;

/// A strict less-than comparator over annotations.
///
/// The same comparator is applied to every sibling list in the tree, at
/// every level. A comparator only has to answer "does `a` precede `b`";
/// [`SortOrder::ordering`] derives a total order from the two directed
/// answers, treating mutual "no" as equal (stable sort keeps input order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Lexicographic by effective id.
    #[default]
    Id,
    /// Least recently updated first.
    Oldest,
    /// Most recently updated first.
    Newest,
    /// Caller-supplied strict less-than predicate.
    Custom(fn(&Annotation, &Annotation) -> bool),
}

impl SortOrder {
    /// True iff `a` strictly precedes `b` under this order.
    #[must_use]
    pub fn precedes(&self, a: &Annotation, b: &Annotation) -> bool {
        match self {
            SortOrder::Id => a.effective_id() < b.effective_id(),
            SortOrder::Oldest => a.updated < b.updated,
            SortOrder::Newest => a.updated > b.updated,
            SortOrder::Custom(lt) => lt(a, b),
        }
    }

    /// Total ordering derived from the strict less-than predicate.
    #[must_use]
    pub fn ordering(&self, a: &Annotation, b: &Annotation) -> Ordering {
        if self.precedes(a, b) {
            Ordering::Less
        } else if self.precedes(b, a) {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}
