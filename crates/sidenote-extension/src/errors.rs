//! Injection error domain.
//!
//! Most injection failures are user-actionable and surface through the
//! browser action: the tab transitions to the errored state and the next
//! click shows contextual help for the failure. Blocked sites are the
//! exception and fail silently.

use std::fmt;

/// Why the sidebar could not be injected into a tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectionError {
    /// The tab is on a browser-internal page the extension cannot touch.
    RestrictedProtocol,
    /// The tab's site is on the blocklist. Silent; not shown to the user.
    BlockedSite,
    /// A local PDF needs file-scheme access, which the user has not
    /// granted.
    NoFileAccess,
    /// Local HTML files are not supported.
    LocalFile,
    /// Script injection transport failed.
    Failed(String),
}

impl fmt::Display for InjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RestrictedProtocol => {
                write!(f, "annotation is not supported on browser pages")
            }
            Self::BlockedSite => write!(f, "annotation is disabled on this site"),
            Self::NoFileAccess => {
                write!(f, "access to file:// URLs has not been granted")
            }
            Self::LocalFile => write!(f, "local HTML files are not supported"),
            Self::Failed(msg) => write!(f, "script injection failed: {msg}"),
        }
    }
}

impl std::error::Error for InjectionError {}

/// Contextual help subjects, keyed by error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    RestrictedProtocol,
    LocalFile,
    NoFileAccess,
    Other,
}

impl InjectionError {
    /// Whether the failure should surface to the user via the errored tab
    /// state. Blocked sites stay silent.
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, Self::BlockedSite)
    }

    /// The help subject shown when the user clicks an errored tab's action
    /// button.
    #[must_use]
    pub fn help_topic(&self) -> HelpTopic {
        match self {
            Self::RestrictedProtocol => HelpTopic::RestrictedProtocol,
            Self::LocalFile => HelpTopic::LocalFile,
            Self::NoFileAccess => HelpTopic::NoFileAccess,
            Self::BlockedSite | Self::Failed(_) => HelpTopic::Other,
        }
    }
}
