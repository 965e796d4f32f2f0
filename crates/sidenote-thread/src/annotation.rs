//! The annotation entity consumed by the thread builder.
//!
//! Annotations are owned by the remote API; this crate only reads them.
//! Until the server confirms an annotation it has no `id`, so identity falls
//! back to the client-session `local_tag`.

use serde::{Deserialize, Serialize};

/// A user-authored note anchored to a location in a document, possibly
/// replying to another annotation.
///
/// `references` lists ancestor ids oldest-first; the last entry is the
/// immediate parent. Entries may name annotations that are not part of the
/// currently loaded set ("dangling" references).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Annotation {
    /// Server-assigned identifier. Absent until the annotation is persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client-session tag, stable for the lifetime of the client session.
    #[serde(rename = "$tag", default)]
    pub local_tag: String,
    /// Ancestor ids, oldest first. Last entry is the immediate parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created: i64,
    /// Last-update time, epoch milliseconds.
    #[serde(default)]
    pub updated: i64,
}

impl Annotation {
    /// Create an unsaved annotation with only a client tag.
    #[must_use]
    pub fn new(local_tag: impl Into<String>) -> Self {
        Self {
            local_tag: local_tag.into(),
            ..Self::default()
        }
    }

    /// Set the server-assigned id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the ancestor reference chain, oldest first.
    #[must_use]
    pub fn replying_to<I, S>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = references.into_iter().map(Into::into).collect();
        self
    }

    /// Set the last-update timestamp (epoch milliseconds).
    #[must_use]
    pub fn updated_at(mut self, updated: i64) -> Self {
        self.updated = updated;
        self
    }

    /// Set the creation timestamp (epoch milliseconds).
    #[must_use]
    pub fn created_at(mut self, created: i64) -> Self {
        self.created = created;
        self
    }

    /// Persistent identifier: the server id if present, else the client tag.
    #[must_use]
    pub fn effective_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.local_tag)
    }

    /// Whether two annotations refer to the same entity.
    ///
    /// Two annotations match if their effective ids agree or they share a
    /// client tag (an unsaved annotation later confirmed by the server keeps
    /// its tag).
    #[must_use]
    pub fn same_entity(&self, other: &Annotation) -> bool {
        self.effective_id() == other.effective_id()
            || (!self.local_tag.is_empty() && self.local_tag == other.local_tag)
    }

    /// Whether this annotation is a reply (has at least one ancestor).
    #[must_use]
    pub fn is_reply(&self) -> bool {
        !self.references.is_empty()
    }
}
