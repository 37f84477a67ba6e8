//! Page URL construction for catalog pagination.
//!
//! Sites disagree on whether page 1 is the bare category URL or carries an
//! explicit `page=1`; the policy is kept per site profile.

use serde::{Deserialize, Serialize};

/// How the first catalog page is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirstPagePolicy {
    /// Page 1 is the category URL exactly as given
    BareUrl,
    /// Page 1 gets `page=1` like every other page
    AppendPageParam,
}

/// Build the URL of catalog page `page` (1-based).
///
/// Appends `page=<n>` with `?` when the base URL has no query string yet,
/// otherwise with `&`. An existing `page` parameter is not replaced.
pub fn build_page_url(base_url: &str, page: u32, policy: FirstPagePolicy) -> String {
    if page <= 1 && policy == FirstPagePolicy::BareUrl {
        return base_url.to_string();
    }

    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{base_url}{separator}page={page}")
}
