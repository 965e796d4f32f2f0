//! Durable per-tab storage.
//!
//! Tab state survives extension restarts through a pluggable
//! [`Storage`] backend holding one JSON document. Storage failures never
//! panic and never poison the in-memory cache: saves log and carry on,
//! loads skip corrupt entries and keep whatever parses.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::tab_state::{TabId, TabState};

/// Errors from a storage backend.
#[derive(Debug)]
pub enum StoreError {
    /// I/O failure in the backend.
    Io(std::io::Error),
    /// Encoding or decoding the JSON document failed.
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::Serialization(msg) => write!(f, "serialization error: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Serialization(_) => None,
        }
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Pluggable backend holding the serialized tab-state document.
pub trait Storage {
    /// Load the stored document; `None` on first run.
    fn load(&self) -> StoreResult<Option<String>>;

    /// Replace the stored document.
    fn save(&self, data: &str) -> StoreResult<()>;
}

/// In-memory backend for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RefCell<Option<String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend pre-seeded with a serialized document.
    #[must_use]
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: RefCell::new(Some(data.into())),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> StoreResult<Option<String>> {
        Ok(self.data.borrow().clone())
    }

    fn save(&self, data: &str) -> StoreResult<()> {
        *self.data.borrow_mut() = Some(data.to_owned());
        Ok(())
    }
}

/// Durable per-tab state, cached in memory and written through on every
/// change.
pub struct TabStore {
    storage: Box<dyn Storage>,
    cache: HashMap<TabId, TabState>,
}

impl fmt::Debug for TabStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabStore")
            .field("cache", &self.cache)
            .finish()
    }
}

impl TabStore {
    /// Create a store over a backend and load whatever it holds.
    #[must_use]
    pub fn new(storage: Box<dyn Storage>) -> Self {
        let mut store = Self {
            storage,
            cache: HashMap::new(),
        };
        store.reload();
        store
    }

    /// Re-read the backend, replacing the cache.
    ///
    /// An unreadable or corrupt document degrades to an empty store; a
    /// document with some bad entries keeps the good ones.
    pub fn reload(&mut self) {
        self.cache.clear();
        let raw = match self.storage.load() {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(err) => {
                warn!(%err, "failed to read tab store, starting empty");
                return;
            }
        };
        let entries: HashMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(%err, "tab store document is corrupt, starting empty");
                return;
            }
        };
        for (key, value) in entries {
            let Ok(tab) = key.parse::<TabId>() else {
                warn!(key, "skipping tab store entry with a bad key");
                continue;
            };
            match serde_json::from_value::<TabState>(value) {
                Ok(state) => {
                    self.cache.insert(tab, state);
                }
                Err(err) => warn!(tab, %err, "skipping corrupt tab store entry"),
            }
        }
    }

    /// All stored tabs.
    #[must_use]
    pub fn all(&self) -> HashMap<TabId, TabState> {
        self.cache.clone()
    }

    /// Stored state for one tab.
    #[must_use]
    pub fn get(&self, tab: TabId) -> Option<&TabState> {
        self.cache.get(&tab)
    }

    /// Store a tab's state and write through.
    pub fn set(&mut self, tab: TabId, state: TabState) {
        self.cache.insert(tab, state);
        self.persist();
    }

    /// Drop a tab and write through.
    pub fn unset(&mut self, tab: TabId) {
        if self.cache.remove(&tab).is_some() {
            self.persist();
        }
    }

    fn persist(&self) {
        let entries: HashMap<String, &TabState> = self
            .cache
            .iter()
            .map(|(tab, state)| (tab.to_string(), state))
            .collect();
        let raw = match serde_json::to_string(&entries) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, "failed to encode tab store");
                return;
            }
        };
        if let Err(err) = self.storage.save(&raw) {
            warn!(%err, "failed to write tab store");
        }
    }
}
