//! Projection of a flat annotation list into a renderable thread tree.
//!
//! [`build_thread`] is a pure function: it never mutates its inputs, holds no
//! state between calls, and rebuilds the whole tree on every call. Callers
//! re-run it whenever annotations, filters or the sort order change.
//!
//! # Parent resolution
//!
//! Each annotation's `references` list is scanned backwards (most specific
//! ancestor first). The first referenced id that is present in the loaded set
//! and whose ancestor chain does not already contain the annotation becomes
//! the parent; remaining candidates are ignored. An annotation with no
//! acceptable candidate becomes a top-level thread. This makes threading a
//! total function over dirty input: dangling references, duplicate ids and
//! reference cycles all resolve to a forest.
//!
//! Internally threads live in an arena indexed by position; parent links are
//! indices into the arena, never owning pointers, so cyclic reference chains
//! in the input cannot create cyclic ownership here.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::annotation::Annotation;
use crate::sort::SortOrder;

/// Filter, expansion and ordering inputs for [`build_thread`].
///
/// | Field | Default | Effect |
/// |-------|---------|--------|
/// | `selected` | empty | non-empty: only these ids are visible |
/// | `force_visible` | empty | always visible, overrides all filters |
/// | `expanded` | empty | ids whose children are shown by default |
/// | `search_filter` | none | predicate; non-matching threads are hidden |
/// | `sort` | [`SortOrder::Id`] | sibling order at every level |
pub struct BuildOptions {
    /// When non-empty, restrict visibility to exactly these ids.
    pub selected: HashSet<String>,
    /// Ids that are always shown regardless of filters.
    pub force_visible: HashSet<String>,
    /// Ids whose children are shown by default.
    pub expanded: HashSet<String>,
    /// Predicate applied to each annotation; `None` means no filtering.
    pub search_filter: Option<Box<dyn Fn(&Annotation) -> bool>>,
    /// Sibling comparator, reused recursively for children.
    pub sort: SortOrder,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            selected: HashSet::new(),
            force_visible: HashSet::new(),
            expanded: HashSet::new(),
            search_filter: None,
            sort: SortOrder::default(),
        }
    }
}

impl std::fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildOptions")
            .field("selected", &self.selected)
            .field("force_visible", &self.force_visible)
            .field("expanded", &self.expanded)
            .field("search_filter", &self.search_filter.is_some())
            .field("sort", &self.sort)
            .finish()
    }
}

impl BuildOptions {
    /// Options with no filtering and the default sort order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict visibility to exactly these ids.
    #[must_use]
    pub fn select<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Always show these ids, regardless of filters.
    #[must_use]
    pub fn force_visible<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.force_visible = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Show children of these ids by default.
    #[must_use]
    pub fn expand<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expanded = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Hide annotations for which the predicate returns false.
    #[must_use]
    pub fn filter(mut self, predicate: impl Fn(&Annotation) -> bool + 'static) -> Self {
        self.search_filter = Some(Box::new(predicate));
        self
    }

    /// Set the sibling sort order.
    #[must_use]
    pub fn sort_by(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// A node in the reply tree.
///
/// The root returned by [`build_thread`] is synthetic: `annotation` is `None`
/// and its children are the top-level threads. `parent` holds the effective
/// id of the parent annotation for lookup; it is never an owning link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Thread {
    /// The wrapped annotation; `None` only for the synthetic root.
    pub annotation: Option<Annotation>,
    /// Effective id of the resolved parent, if any.
    pub parent: Option<String>,
    /// Child threads, ordered by the build's sort order.
    pub children: Vec<Thread>,
    /// Whether this thread should render under the current filters.
    pub visible: bool,
    /// Whether children are hidden by default.
    pub collapsed: bool,
    /// Number of threads in the subtree below this one.
    pub reply_count: usize,
}

impl Thread {
    /// Effective id of the wrapped annotation, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.annotation.as_ref().map(Annotation::effective_id)
    }

    /// True if any descendant of this thread is visible.
    #[must_use]
    pub fn has_visible_descendant(&self) -> bool {
        self.children
            .iter()
            .any(|child| child.visible || child.has_visible_descendant())
    }

    /// Depth-first search for the thread wrapping the given effective id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&Thread> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Total number of threads in this subtree, including this one.
    #[must_use]
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(Thread::size).sum::<usize>()
    }
}

/// Arena node used during reconstruction. Parent/children are arena indices.
struct Slot {
    ann: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Build the identity map and resolve parents, returning the arena and the
/// root indices in input order.
fn thread_annotations(annotations: &[Annotation]) -> (Vec<Slot>, Vec<usize>) {
    let mut slots: Vec<Slot> = Vec::with_capacity(annotations.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(annotations.len());

    for (i, ann) in annotations.iter().enumerate() {
        slots.push(Slot {
            ann: i,
            parent: None,
            children: Vec::new(),
        });
        // Duplicate effective ids: the later annotation wins and the earlier
        // slot is orphaned (it is neither a root nor anyone's child).
        index.insert(ann.effective_id(), i);
    }

    // Live slots, in input order. Orphaned duplicates are excluded.
    let live: Vec<usize> = annotations
        .iter()
        .enumerate()
        .filter(|(i, ann)| index[ann.effective_id()] == *i)
        .map(|(i, _)| i)
        .collect();

    for &i in &live {
        let ann = &annotations[slots[i].ann];
        // Scan references from the most specific ancestor backwards and take
        // the first candidate that exists and does not close a cycle.
        for reference in ann.references.iter().rev() {
            let Some(&candidate) = index.get(reference.as_str()) else {
                continue;
            };
            if chain_contains(&slots, annotations, candidate, ann.effective_id()) {
                continue;
            }
            slots[i].parent = Some(candidate);
            slots[candidate].children.push(i);
            break;
        }
    }

    let roots: Vec<usize> = live
        .into_iter()
        .filter(|&i| slots[i].parent.is_none())
        .collect();
    (slots, roots)
}

/// True if walking parent links upward from `start` (inclusive) reaches a
/// slot whose annotation has the given effective id.
fn chain_contains(slots: &[Slot], annotations: &[Annotation], start: usize, id: &str) -> bool {
    let mut current = Some(start);
    while let Some(i) = current {
        if annotations[slots[i].ann].effective_id() == id {
            return true;
        }
        current = slots[i].parent;
    }
    false
}

/// Materialize the arena subtree rooted at `slot` into an owned [`Thread`].
fn materialize(
    slots: &[Slot],
    annotations: &[Annotation],
    slot: usize,
    parent: Option<&str>,
) -> Thread {
    let ann = &annotations[slots[slot].ann];
    let children = slots[slot]
        .children
        .iter()
        .map(|&child| materialize(slots, annotations, child, Some(ann.effective_id())))
        .collect();
    Thread {
        annotation: Some(ann.clone()),
        parent: parent.map(str::to_owned),
        children,
        visible: true,
        collapsed: true,
        reply_count: 0,
    }
}

/// Project, filter and sort a flat list of annotations into the thread tree
/// that should be rendered.
///
/// Pure and deterministic: identical inputs produce structurally equal trees.
/// Runs to completion synchronously; the tree never observes intermediate
/// annotation state.
#[must_use]
pub fn build_thread(annotations: &[Annotation], opts: &BuildOptions) -> Thread {
    let (slots, roots) = thread_annotations(annotations);

    let mut root = Thread {
        annotation: None,
        parent: None,
        children: roots
            .iter()
            .map(|&i| materialize(&slots, annotations, i, None))
            .collect(),
        visible: true,
        collapsed: false,
        reply_count: 0,
    };

    apply_visibility(&mut root, opts);
    apply_expansion(&mut root, opts);

    // Drop top-level threads with nothing to show.
    root.children
        .retain(|child| child.visible || child.has_visible_descendant());

    sort_siblings(&mut root, opts.sort);
    count_replies(&mut root);

    debug!(
        annotations = annotations.len(),
        top_level = root.children.len(),
        total = root.size() - 1,
        "thread rebuilt"
    );
    root
}

/// Whether an annotation passes the visibility filters.
fn is_shown(ann: &Annotation, opts: &BuildOptions) -> bool {
    let id = ann.effective_id();
    if opts.force_visible.contains(id) {
        return true;
    }
    if !opts.selected.is_empty() && !opts.selected.contains(id) {
        return false;
    }
    match &opts.search_filter {
        Some(filter) => filter(ann),
        None => true,
    }
}

fn apply_visibility(thread: &mut Thread, opts: &BuildOptions) {
    thread.visible = match &thread.annotation {
        Some(ann) => is_shown(ann, opts),
        // The synthetic root is always visible.
        None => true,
    };
    for child in &mut thread.children {
        apply_visibility(child, opts);
    }
}

fn apply_expansion(thread: &mut Thread, opts: &BuildOptions) {
    // A search match deep in a subtree forces the path to it open.
    let surfaced_by_search = opts.search_filter.is_some() && thread.has_visible_descendant();
    thread.collapsed = match &thread.annotation {
        Some(ann) => !surfaced_by_search && !opts.expanded.contains(ann.effective_id()),
        None => false,
    };
    for child in &mut thread.children {
        apply_expansion(child, opts);
    }
}

fn sort_siblings(thread: &mut Thread, sort: SortOrder) {
    thread.children.sort_by(|a, b| {
        match (&a.annotation, &b.annotation) {
            (Some(a), Some(b)) => sort.ordering(a, b),
            // Never the case below the root; keep input order if it were.
            _ => std::cmp::Ordering::Equal,
        }
    });
    for child in &mut thread.children {
        sort_siblings(child, sort);
    }
}

fn count_replies(thread: &mut Thread) {
    let mut total = 0;
    for child in &mut thread.children {
        count_replies(child);
        total += 1 + child.reply_count;
    }
    thread.reply_count = total;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann(id: &str) -> Annotation {
        Annotation::new(format!("tag-{id}")).with_id(id)
    }

    #[test]
    fn empty_input_yields_bare_root() {
        let root = build_thread(&[], &BuildOptions::new());
        assert!(root.annotation.is_none());
        assert!(root.children.is_empty());
        assert!(root.visible);
        assert!(!root.collapsed);
        assert_eq!(root.reply_count, 0);
    }

    #[test]
    fn replies_nest_under_parents() {
        let annotations = vec![ann("a"), ann("b").replying_to(["a"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id(), Some("a"));
        assert_eq!(root.children[0].children[0].id(), Some("b"));
        assert_eq!(root.children[0].children[0].parent.as_deref(), Some("a"));
    }

    #[test]
    fn backward_scan_picks_most_specific_live_ancestor() {
        // Reference list [a, b] is scanned from the end, so b wins.
        let annotations = vec![
            ann("a").updated_at(10),
            ann("b").replying_to(["a"]).updated_at(20),
            ann("c").replying_to(["a", "b"]).updated_at(15),
        ];
        let root = build_thread(&annotations, &BuildOptions::new().sort_by(SortOrder::Oldest));
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.id(), Some("a"));
        assert_eq!(a.children.len(), 1);
        assert_eq!(a.children[0].id(), Some("b"));
        assert_eq!(a.children[0].children[0].id(), Some("c"));
        assert_eq!(a.reply_count, 2);
    }

    #[test]
    fn dangling_reference_falls_back_to_next_candidate() {
        let annotations = vec![ann("a"), ann("c").replying_to(["a", "missing"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].children[0].id(), Some("c"));
    }

    #[test]
    fn fully_dangling_reply_becomes_root() {
        let annotations = vec![ann("a"), ann("b").replying_to(["gone"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        let ids: Vec<_> = root.children.iter().filter_map(Thread::id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn self_reference_is_rejected() {
        let annotations = vec![ann("a").replying_to(["a"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id(), Some("a"));
        assert!(root.children[0].children.is_empty());
    }

    #[test]
    fn two_cycle_resolves_to_forest() {
        let annotations = vec![ann("a").replying_to(["b"]), ann("b").replying_to(["a"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        // a's parent resolves first; b's would close the cycle and is
        // rejected, so b becomes the single root.
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id(), Some("b"));
        assert_eq!(root.children[0].children[0].id(), Some("a"));
    }

    #[test]
    fn three_cycle_terminates_and_stays_a_forest() {
        let annotations = vec![
            ann("a").replying_to(["c"]),
            ann("b").replying_to(["a"]),
            ann("c").replying_to(["b"]),
        ];
        let root = build_thread(&annotations, &BuildOptions::new());
        // Every annotation appears exactly once.
        assert_eq!(root.size(), 4);
        for id in ["a", "b", "c"] {
            assert!(root.find(id).is_some(), "missing {id}");
        }
    }

    #[test]
    fn duplicate_ids_last_wins() {
        let annotations = vec![
            ann("a").updated_at(1),
            ann("a").updated_at(2),
            ann("b").replying_to(["a"]),
        ];
        let root = build_thread(&annotations, &BuildOptions::new());
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert_eq!(a.annotation.as_ref().unwrap().updated, 2);
        assert_eq!(a.children[0].id(), Some("b"));
    }

    #[test]
    fn selection_hides_other_threads() {
        let annotations = vec![ann("a"), ann("b")];
        let opts = BuildOptions::new().select(["a"]);
        let root = build_thread(&annotations, &opts);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id(), Some("a"));
    }

    #[test]
    fn force_visible_overrides_search_filter() {
        let annotations = vec![ann("a"), ann("b")];
        let opts = BuildOptions::new()
            .filter(|_| false)
            .force_visible(["b"]);
        let root = build_thread(&annotations, &opts);
        assert_eq!(root.children.len(), 1);
        assert_eq!(root.children[0].id(), Some("b"));
        assert!(root.children[0].visible);
    }

    #[test]
    fn filter_matching_nothing_prunes_all_top_level_threads() {
        let annotations = vec![ann("a"), ann("b").replying_to(["a"])];
        let opts = BuildOptions::new().filter(|_| false);
        let root = build_thread(&annotations, &opts);
        assert!(root.children.is_empty());
        assert!(root.visible);
    }

    #[test]
    fn search_match_in_reply_keeps_and_expands_ancestors() {
        let annotations = vec![ann("a"), ann("b").replying_to(["a"])];
        let opts = BuildOptions::new().filter(|ann| ann.effective_id() == "b");
        let root = build_thread(&annotations, &opts);
        assert_eq!(root.children.len(), 1);
        let a = &root.children[0];
        assert!(!a.visible);
        // The matching reply forces the parent open.
        assert!(!a.collapsed);
        assert!(a.children[0].visible);
    }

    #[test]
    fn threads_collapse_unless_expanded() {
        let annotations = vec![ann("a"), ann("b").replying_to(["a"])];
        let root = build_thread(&annotations, &BuildOptions::new());
        assert!(root.children[0].collapsed);

        let opts = BuildOptions::new().expand(["a"]);
        let root = build_thread(&annotations, &opts);
        assert!(!root.children[0].collapsed);
    }

    #[test]
    fn siblings_sorted_recursively() {
        let annotations = vec![
            ann("root").updated_at(0),
            ann("r1").replying_to(["root"]).updated_at(30),
            ann("r2").replying_to(["root"]).updated_at(10),
            ann("r3").replying_to(["root"]).updated_at(20),
        ];
        let opts = BuildOptions::new().sort_by(SortOrder::Oldest);
        let root = build_thread(&annotations, &opts);
        let order: Vec<_> = root.children[0]
            .children
            .iter()
            .filter_map(Thread::id)
            .collect();
        assert_eq!(order, vec!["r2", "r3", "r1"]);

        let opts = BuildOptions::new().sort_by(SortOrder::Newest);
        let root = build_thread(&annotations, &opts);
        let order: Vec<_> = root.children[0]
            .children
            .iter()
            .filter_map(Thread::id)
            .collect();
        assert_eq!(order, vec!["r1", "r3", "r2"]);
    }

    #[test]
    fn reply_counts_sum_over_descendants() {
        let annotations = vec![
            ann("a"),
            ann("b").replying_to(["a"]),
            ann("c").replying_to(["a", "b"]),
            ann("d").replying_to(["a"]),
        ];
        let root = build_thread(&annotations, &BuildOptions::new());
        let a = root.find("a").unwrap();
        assert_eq!(a.reply_count, 3);
        assert_eq!(root.find("b").unwrap().reply_count, 1);
        assert_eq!(root.reply_count, 4);
    }

    #[test]
    fn identical_inputs_build_equal_trees() {
        let annotations = vec![
            ann("a").updated_at(5),
            ann("b").replying_to(["a"]).updated_at(7),
            ann("c").replying_to(["missing"]).updated_at(6),
        ];
        let opts = BuildOptions::new().sort_by(SortOrder::Newest).expand(["a"]);
        let first = build_thread(&annotations, &opts);
        let second = build_thread(&annotations, &opts);
        assert_eq!(first, second);
    }
}
