//! Extension orchestrator.
//!
//! [`Extension`] ties the pieces together: browser events come in, the
//! per-tab state machine transitions, and the injector, badge service and
//! help UI are driven to match. Two rules shape every flow here:
//!
//! - State changes first, side effects second. The installed flag is set
//!   optimistically before the inject call so a crash mid-install leaves
//!   a visible inconsistency rather than a silent one.
//! - Errored tabs are never persisted. A restart forgets the error and
//!   the tab starts over from its last good state.

use std::collections::HashMap;

use tracing::{debug, error, warn};
use url::Url;

use crate::badge::{badge_text, badge_url, parse_badge_response, BadgeFetcher};
use crate::errors::{HelpTopic, InjectionError};
use crate::injector::{is_restricted_url, ContentScripts, FileAccess, SidebarInjector, Tab, TabControl};
use crate::tab_state::{Activation, TabId, TabStateStore};
use crate::tab_store::TabStore;

/// User-facing extension settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base URL of the annotation service, for badge requests.
    pub service_url: Url,
    /// Keep the sidebar active across in-tab navigations.
    pub keep_active_on_page_change: bool,
}

/// Surface that shows contextual help for a failed tab.
pub trait HelpUi {
    fn show_help(&self, tab: TabId, topic: HelpTopic);
}

/// The extension core: event handlers over the tab state machine.
pub struct Extension<S, T, F, B, H> {
    state: TabStateStore,
    store: TabStore,
    injector: SidebarInjector<S, T, F>,
    badge: B,
    help: H,
    settings: Settings,
    /// Last user-visible injection failure per tab, for contextual help.
    errors: HashMap<TabId, InjectionError>,
    /// Last committed URL per tab, for the stale badge-response guard.
    urls: HashMap<TabId, String>,
}

impl<S, T, F, B, H> Extension<S, T, F, B, H>
where
    S: ContentScripts,
    T: TabControl,
    F: FileAccess,
    B: BadgeFetcher,
    H: HelpUi,
{
    /// Build the extension and restore persisted tab state.
    #[must_use]
    pub fn new(
        store: TabStore,
        injector: SidebarInjector<S, T, F>,
        badge: B,
        help: H,
        settings: Settings,
    ) -> Self {
        let mut state = TabStateStore::new();
        state.load(store.all());
        Self {
            state,
            store,
            injector,
            badge,
            help,
            settings,
            errors: HashMap::new(),
            urls: HashMap::new(),
        }
    }

    /// Read-only view of the tab state machine.
    #[must_use]
    pub fn state(&self) -> &TabStateStore {
        &self.state
    }

    /// The cached failure for a tab, if it is errored.
    #[must_use]
    pub fn last_error(&self, tab: TabId) -> Option<&InjectionError> {
        self.errors.get(&tab)
    }

    /// Badge text for a tab, or `None` when the count is zero.
    #[must_use]
    pub fn badge_text(&self, tab: TabId) -> Option<String> {
        let count = self.state.get(tab).annotation_count;
        (count > 0).then(|| badge_text(count))
    }

    /// The user clicked the browser-action button.
    ///
    /// An errored tab shows help for its cached failure; otherwise the
    /// click toggles activation and the tab is synced.
    pub async fn on_browser_action_clicked(&mut self, tab: &Tab) {
        if self.state.is_errored(tab.id) {
            let topic = self
                .errors
                .get(&tab.id)
                .map_or(HelpTopic::Other, InjectionError::help_topic);
            self.help.show_help(tab.id, topic);
            return;
        }
        if self.state.is_active(tab.id) {
            self.state.deactivate(tab.id);
        } else {
            self.state.activate(tab.id);
        }
        self.commit(tab.id);
        self.sync_tab(tab).await;
    }

    /// A new tab opened. Any stale state under its id is discarded.
    pub fn on_tab_created(&mut self, tab: TabId) {
        self.forget(tab);
    }

    /// A tab closed.
    pub fn on_tab_removed(&mut self, tab: TabId) {
        self.forget(tab);
    }

    /// The browser swapped a tab for another (e.g. a prerendered page).
    ///
    /// Activation carries over to the new tab; everything else starts
    /// fresh, and the annotation count is re-requested.
    pub async fn on_tab_replaced(&mut self, old_tab: TabId, new_tab: &Tab) {
        self.state.on_tab_replaced(old_tab, new_tab.id);
        self.errors.remove(&old_tab);
        self.urls.remove(&old_tab);
        self.store.unset(old_tab);
        self.urls.insert(new_tab.id, new_tab.url.clone());
        self.commit(new_tab.id);
        self.update_badge(new_tab).await;
    }

    /// A navigation committed in a tab.
    pub async fn on_navigation_committed(&mut self, tab: &Tab) {
        self.urls.insert(tab.id, tab.url.clone());
        self.update_badge(tab).await;
    }

    /// The tab's document unloaded; a new one is on its way.
    pub fn on_document_unloaded(&mut self, tab: TabId) {
        self.state
            .reset_on_document_unload(tab, self.settings.keep_active_on_page_change);
        self.commit(tab);
    }

    /// The tab's new document finished loading.
    pub async fn on_dom_content_loaded(&mut self, tab: &Tab) {
        self.state.update(tab.id, |state| state.ready = true);
        self.commit(tab.id);
        self.sync_tab(tab).await;
    }

    /// Bring the page in a tab in line with the tab's desired state.
    ///
    /// Does nothing until the document is ready. Failures transition the
    /// tab to errored (unless the failure is silent) and are cached for
    /// the help UI.
    pub async fn sync_tab(&mut self, tab: &Tab) {
        let current = self.state.get(tab.id);
        if !current.ready {
            return;
        }
        if current.state == Activation::Active && !current.extension_sidebar_installed {
            // Record the install before starting it so an interrupted
            // install is re-driven on the next sync rather than lost.
            self.state
                .update(tab.id, |state| state.extension_sidebar_installed = true);
            self.commit(tab.id);
            if let Err(err) = self.injector.inject_into_tab(tab).await {
                error!(tab = tab.id, %err, "sidebar injection failed");
                self.state
                    .update(tab.id, |state| state.extension_sidebar_installed = false);
                if err.is_user_visible() {
                    self.errors.insert(tab.id, err);
                    self.state.error(tab.id);
                } else {
                    self.state.deactivate(tab.id);
                }
                self.commit(tab.id);
            }
        } else if current.state == Activation::Inactive && current.extension_sidebar_installed {
            if let Err(err) = self.injector.remove_from_tab(tab).await {
                error!(tab = tab.id, %err, "sidebar removal failed");
            }
            self.state
                .update(tab.id, |state| state.extension_sidebar_installed = false);
            self.commit(tab.id);
        }
    }

    /// Refresh the annotation count for a tab from the badge service.
    ///
    /// URLs the sidebar can never load on keep a zero count without a
    /// request. A response for a URL the tab has since navigated away
    /// from is discarded.
    pub async fn update_badge(&mut self, tab: &Tab) {
        if is_restricted_url(&tab.url)
            || tab.url.starts_with("file:")
            || self.injector.blocklist().matches(&tab.url)
        {
            self.state.update(tab.id, |state| state.annotation_count = 0);
            return;
        }
        let request = badge_url(&self.settings.service_url, &tab.url);
        let body = match self.badge.fetch(&request).await {
            Ok(body) => body,
            Err(err) => {
                warn!(tab = tab.id, %err, "badge request failed");
                return;
            }
        };
        if self
            .urls
            .get(&tab.id)
            .is_some_and(|current| current != &tab.url)
        {
            debug!(tab = tab.id, "discarding stale badge response");
            return;
        }
        if let Some(total) = parse_badge_response(&body) {
            self.state
                .update(tab.id, |state| state.annotation_count = total);
        }
    }

    /// Persist a tab's state, except that errored tabs are never written:
    /// the error is session-local and a restart forgets it.
    fn commit(&mut self, tab: TabId) {
        let state = self.state.get(tab);
        if state.state == Activation::Errored {
            return;
        }
        self.errors.remove(&tab);
        self.store.set(tab, state);
    }

    fn forget(&mut self, tab: TabId) {
        self.state.clear(tab);
        self.store.unset(tab);
        self.errors.remove(&tab);
        self.urls.remove(&tab);
    }
}
