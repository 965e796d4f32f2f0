#![forbid(unsafe_code)]

//! Browser-extension core: tab lifecycle, injection policy and badge.
//!
//! This crate models the extension side of the annotation client without
//! touching a real browser. Browser capabilities (running scripts in a
//! page, navigating tabs, fetching over HTTP, showing help) are traits;
//! the core is the pure decision-making between them:
//!
//! - [`TabStateStore`] is the per-tab state machine, with
//!   [`TabStore`] persisting it across restarts.
//! - [`SidebarInjector`] decides whether and how the sidebar loads into
//!   a tab, and applies the decision.
//! - [`Extension`] wires browser events to the two.
//!
//! ```
//! use sidenote_extension::{Blocklist, InjectionError};
//!
//! let blocklist = Blocklist::new(["example.com"]);
//! assert!(blocklist.matches("https://www.example.com/page"));
//! assert!(!InjectionError::BlockedSite.is_user_visible());
//! ```

pub mod badge;
pub mod blocklist;
pub mod errors;
pub mod extension;
pub mod injector;
pub mod tab_state;
pub mod tab_store;

pub use badge::{badge_text, badge_url, parse_badge_response, BadgeFetcher, FetchError};
pub use blocklist::Blocklist;
pub use errors::{HelpTopic, InjectionError};
pub use extension::{Extension, HelpUi, Settings};
pub use injector::{
    is_restricted_url, ContentScripts, ContentType, Decision, FileAccess, SidebarInjector,
    SkipReason, Tab, TabControl,
};
pub use tab_state::{Activation, StateListener, TabId, TabState, TabStateStore};
pub use tab_store::{MemoryStorage, Storage, StoreError, StoreResult, TabStore};
