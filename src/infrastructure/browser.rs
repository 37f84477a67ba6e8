//! Browser capability set the crawler depends on
//!
//! Any automation backend that can navigate, query nodes (optionally scoped
//! to a parent node), read text and attributes, click and run a script can
//! drive the crawl. Reads that wait for a node to appear are unbounded here;
//! callers bound them with `tokio::time::timeout`.

use async_trait::async_trait;
use std::time::Duration;

use super::error::BrowserError;

pub type BrowserResult<T> = Result<T, BrowserError>;

/// Script that scrolls the window to the bottom of the document
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight);";

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Handle to a DOM node; must stay cheap to clone
    type Element: Clone + Send + Sync;

    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// Wait until at least one node matches `selector`
    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<()>;

    /// All nodes currently matching `selector`, in document order
    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<Self::Element>>;

    /// Nodes currently matching `selector` below `parent`; may be empty
    async fn query_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> BrowserResult<Vec<Self::Element>>;

    /// Visible text of the first node matching `selector` below `parent`;
    /// waits for the node to appear
    async fn text_within(&self, parent: &Self::Element, selector: &str) -> BrowserResult<String>;

    async fn attribute(&self, element: &Self::Element, name: &str) -> BrowserResult<Option<String>>;

    async fn click(&self, selector: &str) -> BrowserResult<()>;

    async fn execute(&self, script: &str) -> BrowserResult<()>;

    /// End the browser session
    async fn close(&self) -> BrowserResult<()>;
}
