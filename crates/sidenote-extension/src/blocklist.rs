//! Domains where the sidebar must never load.
//!
//! Matching is by host only: an entry matches its exact domain and every
//! subdomain, regardless of scheme, port, path, query or fragment.

use url::Url;

/// An ordered list of bare domains to skip.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    domains: Vec<String>,
}

impl Blocklist {
    /// Build a blocklist from bare domain names.
    #[must_use]
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|domain| domain.into().trim().to_ascii_lowercase())
                .filter(|domain| !domain.is_empty())
                .collect(),
        }
    }

    /// Whether the URL's host is a blocklisted domain or a subdomain of
    /// one. Unparsable URLs and URLs without a host never match.
    #[must_use]
    pub fn matches(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        self.domains
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
