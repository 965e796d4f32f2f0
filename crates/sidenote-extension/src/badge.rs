//! Annotation-count badge plumbing.
//!
//! The badge service reports how many annotations exist for a URL:
//! `GET <service>/badge?uri=<tab url>` returning `{"total": n}`. Malformed
//! responses are logged and ignored; the badge is simply left unset.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;
use url::Url;

/// Transport failure while fetching a badge count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError(pub String);

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "badge fetch failed: {}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// HTTP client seam for the badge endpoint.
#[async_trait(?Send)]
pub trait BadgeFetcher {
    /// Fetch the raw response body for a badge request URL.
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// Request URL for the annotation count of a tab's URL.
#[must_use]
pub fn badge_url(service_url: &Url, tab_url: &str) -> Url {
    let mut url = service_url.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push("badge");
    }
    url.query_pairs_mut().append_pair("uri", tab_url);
    url
}

#[derive(Deserialize)]
struct BadgeResponse {
    total: serde_json::Value,
}

/// Extract the annotation total from a badge response body.
///
/// Non-JSON bodies, missing fields and non-numeric totals are logged and
/// yield `None`.
#[must_use]
pub fn parse_badge_response(body: &str) -> Option<u64> {
    let response: BadgeResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(err) => {
            warn!(%err, "badge response is not valid JSON");
            return None;
        }
    };
    match response.total.as_u64() {
        Some(total) => Some(total),
        None => {
            warn!(total = %response.total, "badge response total is not a number");
            None
        }
    }
}

/// Display text for an annotation count, clamped to `"999+"`.
#[must_use]
pub fn badge_text(total: u64) -> String {
    if total > 999 {
        "999+".to_owned()
    } else {
        total.to_string()
    }
}
