//! Sidebar injection policy.
//!
//! [`SidebarInjector`] decides whether and how the sidebar loads into a
//! tab, then applies the decision through its collaborators. The decision
//! is a pure function of the tab's URL plus two asynchronous probes
//! (content type and file-scheme access); nothing is persisted between
//! requests.
//!
//! The checks run in a fixed order, and a failing check fails the request
//! before any further script interaction:
//!
//! 1. Browser-internal schemes are rejected outright.
//! 2. Blocklisted sites are rejected silently.
//! 3. `file:` URLs: PDFs go to the bundled viewer if file access is
//!    granted; local HTML is unsupported.
//! 4. Anything else: PDFs go to the bundled viewer; HTML pages get the
//!    config then the embed script, unless the client is already there.

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::blocklist::Blocklist;
use crate::errors::InjectionError;
use crate::tab_state::TabId;

/// URL schemes the extension must never touch.
const RESTRICTED_SCHEMES: &[&str] = &["chrome", "chrome-devtools", "chrome-extension"];

/// Path of the bundled PDF viewer below the extension base URL.
const VIEWER_PATH: &str = "/content/web/viewer.html";

/// A browser tab as seen by the policy: its id and current URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: TabId,
    pub url: String,
}

impl Tab {
    #[must_use]
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
        }
    }
}

/// What the probe found in the tab's document.
///
/// Anything the probe cannot identify is treated as HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Html,
    Pdf,
}

/// Scripts the extension can run inside a tab's page context.
#[async_trait(?Send)]
pub trait ContentScripts {
    /// Probe the document's content type.
    async fn detect_content_type(&self, tab: &Tab) -> Result<ContentType, InjectionError>;

    /// Probe whether the client is already loaded in the page.
    async fn is_client_injected(&self, tab: &Tab) -> Result<bool, InjectionError>;

    /// Inject the configuration script.
    async fn inject_config(&self, tab: &Tab) -> Result<(), InjectionError>;

    /// Inject the embed script that boots the sidebar.
    async fn inject_embed(&self, tab: &Tab) -> Result<(), InjectionError>;

    /// Inject the script that tears the sidebar down.
    async fn inject_destroy(&self, tab: &Tab) -> Result<(), InjectionError>;
}

/// Navigation control over tabs.
#[async_trait(?Send)]
pub trait TabControl {
    async fn navigate(&self, tab: TabId, url: &str) -> Result<(), InjectionError>;
}

/// Query for the file-scheme access permission.
#[async_trait(?Send)]
pub trait FileAccess {
    async fn allowed(&self) -> bool;
}

/// Why an injection request was a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The client is already loaded in this tab.
    AlreadyInjected,
}

/// Outcome of evaluating the decision table for a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Load the client by injecting the config and embed scripts.
    Inject(ContentType),
    /// Navigate the tab to the bundled PDF viewer for this URL.
    RedirectToViewer(String),
    /// Do nothing.
    Skip(SkipReason),
    /// Refuse, with the reason to surface (or not) to the user.
    Fail(InjectionError),
}

/// Decides and applies sidebar injection and removal for tabs.
pub struct SidebarInjector<S, T, F> {
    scripts: S,
    tabs: T,
    file_access: F,
    extension_base: Url,
    blocklist: Blocklist,
}

impl<S, T, F> SidebarInjector<S, T, F>
where
    S: ContentScripts,
    T: TabControl,
    F: FileAccess,
{
    /// `extension_base` is the root URL the extension's bundled assets are
    /// served from.
    #[must_use]
    pub fn new(scripts: S, tabs: T, file_access: F, extension_base: Url, blocklist: Blocklist) -> Self {
        Self {
            scripts,
            tabs,
            file_access,
            extension_base,
            blocklist,
        }
    }

    /// The blocklist this injector consults.
    #[must_use]
    pub fn blocklist(&self) -> &Blocklist {
        &self.blocklist
    }

    /// Evaluate the decision table for a tab without applying anything.
    ///
    /// The early failure branches complete without any script
    /// interaction.
    pub async fn decide(&self, tab: &Tab) -> Decision {
        if is_restricted_url(&tab.url) {
            return Decision::Fail(InjectionError::RestrictedProtocol);
        }
        if self.blocklist.matches(&tab.url) {
            return Decision::Fail(InjectionError::BlockedSite);
        }

        if tab.url.starts_with("file:") {
            // Scripts cannot run in file: tabs unless file access has been
            // granted, so the content type comes from the URL here and the
            // failure branches complete with zero script calls.
            return match sniff_local_content_type(&tab.url) {
                ContentType::Pdf => {
                    if self.file_access.allowed().await {
                        Decision::RedirectToViewer(self.viewer_url(&tab.url))
                    } else {
                        Decision::Fail(InjectionError::NoFileAccess)
                    }
                }
                // Local HTML fails before any config or embed script runs.
                ContentType::Html => Decision::Fail(InjectionError::LocalFile),
            };
        }

        match self.probe_content_type(tab).await {
            ContentType::Pdf => Decision::RedirectToViewer(self.viewer_url(&tab.url)),
            ContentType::Html => match self.scripts.is_client_injected(tab).await {
                Ok(true) => Decision::Skip(SkipReason::AlreadyInjected),
                Ok(false) => Decision::Inject(ContentType::Html),
                Err(err) => Decision::Fail(err),
            },
        }
    }

    /// Load the sidebar into a tab, or explain why that cannot happen.
    pub async fn inject_into_tab(&self, tab: &Tab) -> Result<(), InjectionError> {
        match self.decide(tab).await {
            Decision::Fail(err) => Err(err),
            Decision::Skip(reason) => {
                debug!(tab = tab.id, ?reason, "injection skipped");
                Ok(())
            }
            Decision::RedirectToViewer(viewer) => self.tabs.navigate(tab.id, &viewer).await,
            Decision::Inject(_) => {
                // Config must be in place before the embed script boots.
                self.scripts.inject_config(tab).await?;
                self.scripts.inject_embed(tab).await
            }
        }
    }

    /// Remove the sidebar from a tab.
    ///
    /// PDF viewer tabs navigate back to the document they were opened
    /// for; restricted pages are left alone; HTML pages get the destroy
    /// script only if the client is actually loaded.
    pub async fn remove_from_tab(&self, tab: &Tab) -> Result<(), InjectionError> {
        if let Some(original) = self.original_url_from_viewer(&tab.url) {
            return self.tabs.navigate(tab.id, &original).await;
        }
        if is_restricted_url(&tab.url) {
            return Ok(());
        }
        if self.probe_content_type(tab).await == ContentType::Html
            && self.scripts.is_client_injected(tab).await?
        {
            return self.scripts.inject_destroy(tab).await;
        }
        Ok(())
    }

    /// Content-type probe with the documented fallback: anything the
    /// probe cannot identify is HTML.
    async fn probe_content_type(&self, tab: &Tab) -> ContentType {
        self.scripts
            .detect_content_type(tab)
            .await
            .unwrap_or(ContentType::Html)
    }

    /// Viewer URL for a document:
    /// `<base>/content/web/viewer.html?file=<encoded url>`.
    fn viewer_url(&self, original: &str) -> String {
        let mut viewer = self.extension_base.clone();
        viewer.set_path(VIEWER_PATH);
        viewer.query_pairs_mut().append_pair("file", original);
        viewer.into()
    }

    /// Recover the original document URL from a viewer URL, if `url`
    /// points at this extension's bundled viewer.
    fn original_url_from_viewer(&self, url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        if parsed.scheme() != self.extension_base.scheme()
            || parsed.host_str() != self.extension_base.host_str()
            || parsed.path() != VIEWER_PATH
        {
            return None;
        }
        parsed
            .query_pairs()
            .find(|(key, _)| key == "file")
            .map(|(_, value)| value.into_owned())
    }
}

/// Whether the URL uses a browser-internal scheme the extension must not
/// touch.
#[must_use]
pub fn is_restricted_url(url: &str) -> bool {
    RESTRICTED_SCHEMES
        .iter()
        .any(|scheme| url.starts_with(&format!("{scheme}:")))
}

/// Content type of a local file, judged from the URL alone.
fn sniff_local_content_type(url: &str) -> ContentType {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    if path.to_ascii_lowercase().ends_with(".pdf") {
        ContentType::Pdf
    } else {
        ContentType::Html
    }
}
