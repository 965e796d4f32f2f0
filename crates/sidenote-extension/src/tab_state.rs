//! Per-tab activation state.
//!
//! [`TabStateStore`] is the single owner of tab state: every change goes
//! through its transition methods, and each mutation notifies the
//! subscriber so the browser-action UI and persistence layer can react.
//! Readers get copies; nothing outside this module mutates tab state.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Browser tab identifier.
pub type TabId = u32;

/// Whether the sidebar is meant to be running in a tab.
///
/// `Errored` is terminal until an explicit reset (the next document
/// unload).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    Active,
    #[default]
    Inactive,
    Errored,
}

/// Everything the extension tracks per tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TabState {
    /// Activation state of the sidebar in this tab.
    pub state: Activation,
    /// Whether the tab's document has finished loading.
    pub ready: bool,
    /// Annotation count for the tab's URL, from the badge service.
    pub annotation_count: u64,
    /// Optimistically set before the install sequence starts; reset by the
    /// errored transition and on document unload.
    pub extension_sidebar_installed: bool,
    /// Whether the user granted the active-tab permission.
    pub has_active_tab_permission: bool,
}

/// Subscriber invoked after every mutation. `None` means the tab was
/// cleared.
pub type StateListener = Box<dyn FnMut(TabId, Option<&TabState>)>;

/// Owner of all per-tab state.
#[derive(Default)]
pub struct TabStateStore {
    tabs: HashMap<TabId, TabState>,
    listener: Option<StateListener>,
}

impl fmt::Debug for TabStateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabStateStore")
            .field("tabs", &self.tabs)
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl TabStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store notified through `listener` on every mutation.
    #[must_use]
    pub fn with_listener(listener: StateListener) -> Self {
        Self {
            tabs: HashMap::new(),
            listener: Some(listener),
        }
    }

    /// Replace the change subscriber.
    pub fn set_listener(&mut self, listener: StateListener) {
        self.listener = Some(listener);
    }

    /// Replace all tab state, e.g. from persisted storage at startup.
    /// Does not notify.
    pub fn load(&mut self, tabs: HashMap<TabId, TabState>) {
        self.tabs = tabs;
    }

    /// Current state of a tab; default state for unknown tabs.
    #[must_use]
    pub fn get(&self, tab: TabId) -> TabState {
        self.tabs.get(&tab).cloned().unwrap_or_default()
    }

    /// All known tabs.
    #[must_use]
    pub fn all(&self) -> &HashMap<TabId, TabState> {
        &self.tabs
    }

    #[must_use]
    pub fn is_active(&self, tab: TabId) -> bool {
        self.get(tab).state == Activation::Active
    }

    #[must_use]
    pub fn is_inactive(&self, tab: TabId) -> bool {
        self.get(tab).state == Activation::Inactive
    }

    #[must_use]
    pub fn is_errored(&self, tab: TabId) -> bool {
        self.get(tab).state == Activation::Errored
    }

    /// Transition a tab to [`Activation::Active`].
    pub fn activate(&mut self, tab: TabId) {
        self.update(tab, |state| state.state = Activation::Active);
    }

    /// Transition a tab to [`Activation::Inactive`].
    pub fn deactivate(&mut self, tab: TabId) {
        self.update(tab, |state| state.state = Activation::Inactive);
    }

    /// Transition a tab to [`Activation::Errored`].
    pub fn error(&mut self, tab: TabId) {
        self.update(tab, |state| state.state = Activation::Errored);
    }

    /// Apply a partial mutation and notify the subscriber.
    pub fn update(&mut self, tab: TabId, mutate: impl FnOnce(&mut TabState)) {
        let state = self.tabs.entry(tab).or_default();
        mutate(state);
        self.notify(tab);
    }

    /// Forget a tab entirely. Notifies the subscriber with `None`.
    pub fn clear(&mut self, tab: TabId) {
        self.tabs.remove(&tab);
        self.notify(tab);
    }

    /// Reset a tab's state after its document unloads.
    ///
    /// An errored tab recovers to active; then, unless the keep-active
    /// preference is set, the tab is forced inactive. Load progress, the
    /// annotation count, the installed flag and the permission flag are
    /// always cleared.
    pub fn reset_on_document_unload(&mut self, tab: TabId, keep_active: bool) {
        self.update(tab, |state| {
            if state.state == Activation::Errored {
                state.state = Activation::Active;
            }
            if !keep_active {
                state.state = Activation::Inactive;
            }
            state.ready = false;
            state.annotation_count = 0;
            state.extension_sidebar_installed = false;
            state.has_active_tab_permission = false;
        });
        debug!(tab, "tab state reset on document unload");
    }

    /// Move state from a replaced tab to its replacement.
    ///
    /// Only the activation value survives; the new tab starts ready and
    /// otherwise fresh. The caller is expected to re-request the
    /// annotation count for the new tab.
    pub fn on_tab_replaced(&mut self, old_tab: TabId, new_tab: TabId) {
        let carried = self.get(old_tab).state;
        self.clear(old_tab);
        self.update(new_tab, |state| {
            *state = TabState {
                state: carried,
                ready: true,
                ..TabState::default()
            };
        });
    }

    fn notify(&mut self, tab: TabId) {
        if let Some(mut listener) = self.listener.take() {
            listener(tab, self.tabs.get(&tab));
            self.listener = Some(listener);
        }
    }
}
