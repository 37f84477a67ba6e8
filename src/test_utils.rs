//! Scripted in-memory browser for tests
//!
//! `StubBrowser` serves fixed listing pages keyed by URL. Each page holds
//! product cards built from selector → text and selector → node tables, and
//! can replay a sequence of visible card counts to mimic lazy loading.
//! Every navigation, script and click is recorded for assertions.
//!
//! Reads of selectors a card does not define fail immediately instead of
//! polling, so tests never wait on a missing node.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::infrastructure::browser::{BrowserResult, BrowserSession};
use crate::infrastructure::error::BrowserError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One product card: text per sub-selector plus child nodes per sub-selector
#[derive(Debug, Clone, Default)]
pub struct StubCard {
    texts: HashMap<String, (String, Duration)>,
    nodes: HashMap<String, Vec<StubNode>>,
    lost: HashSet<String>,
}

impl StubCard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(self, selector: &str, text: &str) -> Self {
        self.slow_text(selector, text, Duration::ZERO)
    }

    /// Text that only becomes readable after `delay`
    pub fn slow_text(mut self, selector: &str, text: &str, delay: Duration) -> Self {
        self.texts
            .insert(selector.to_string(), (text.to_string(), delay));
        self
    }

    /// Link node with an `href`
    pub fn link(mut self, selector: &str, href: &str) -> Self {
        self.nodes.insert(
            selector.to_string(),
            vec![StubNode::Link(Some(href.to_string()))],
        );
        self
    }

    /// Link node without an `href` attribute
    pub fn link_without_href(mut self, selector: &str) -> Self {
        self.nodes
            .insert(selector.to_string(), vec![StubNode::Link(None)]);
        self
    }

    /// Reading `selector` reports a lost browser session
    pub fn lost_session(mut self, selector: &str) -> Self {
        self.lost.insert(selector.to_string());
        self
    }

    /// Selector that resolves to an empty node list
    pub fn empty_nodes(mut self, selector: &str) -> Self {
        self.nodes.insert(selector.to_string(), Vec::new());
        self
    }
}

/// Element handle served by `StubBrowser`
#[derive(Debug, Clone)]
pub enum StubNode {
    Card(Arc<StubCard>),
    /// Anchor-like node carrying an optional `href`
    Link(Option<String>),
}

impl StubNode {
    pub fn card(card: StubCard) -> Self {
        Self::Card(Arc::new(card))
    }
}

/// A listing page: cards under `card_selector`
#[derive(Debug)]
pub struct StubPage {
    card_selector: String,
    cards: Vec<StubNode>,
    visible_counts: Vec<usize>,
    queries: usize,
}

impl StubPage {
    pub fn new(card_selector: &str, cards: Vec<StubCard>) -> Self {
        Self {
            card_selector: card_selector.to_string(),
            cards: cards.into_iter().map(StubNode::card).collect(),
            visible_counts: Vec::new(),
            queries: 0,
        }
    }

    /// Visible card count per successive card query; the last entry repeats.
    /// Without counts every card is visible.
    pub fn with_visible_counts(mut self, counts: Vec<usize>) -> Self {
        self.visible_counts = counts;
        self
    }

    fn visible(&self, query: usize) -> usize {
        let count = self
            .visible_counts
            .get(query)
            .or_else(|| self.visible_counts.last())
            .copied()
            .unwrap_or(self.cards.len());
        count.min(self.cards.len())
    }
}

#[derive(Debug, Default)]
pub struct StubBrowser {
    pages: Mutex<HashMap<String, StubPage>>,
    failing_navigation: HashSet<String>,
    lost_session: HashSet<String>,
    current: Mutex<Option<String>>,
    visited: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    clicks: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl StubBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: &str, page: StubPage) -> Self {
        lock(&self.pages).insert(url.to_string(), page);
        self
    }

    /// Navigation to `url` fails with `NavigationFailed`
    pub fn with_failing_navigation(mut self, url: &str) -> Self {
        self.failing_navigation.insert(url.to_string());
        self
    }

    /// Waiting for cards on `url` reports a lost browser session
    pub fn with_lost_session(mut self, url: &str) -> Self {
        self.lost_session.insert(url.to_string());
        self
    }

    /// URLs successfully navigated to, in order
    pub fn visited(&self) -> Vec<String> {
        lock(&self.visited).clone()
    }

    pub fn scripts(&self) -> Vec<String> {
        lock(&self.scripts).clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        lock(&self.clicks).clone()
    }

    /// Card queries served for the page at `url`
    pub fn card_queries(&self, url: &str) -> usize {
        lock(&self.pages).get(url).map_or(0, |page| page.queries)
    }

    pub fn is_closed(&self) -> bool {
        *lock(&self.closed)
    }

    fn current_url(&self) -> Option<String> {
        lock(&self.current).clone()
    }

    fn card_of<'a>(parent: &'a StubNode, selector: &str) -> BrowserResult<&'a StubCard> {
        match parent {
            StubNode::Card(card) if card.lost.contains(selector) => {
                Err(BrowserError::session("chrome not reachable"))
            }
            StubNode::Card(card) => Ok(card.as_ref()),
            StubNode::Link(_) => Err(BrowserError::query(selector, "parent is not a card")),
        }
    }
}

#[async_trait]
impl BrowserSession for StubBrowser {
    type Element = StubNode;

    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        if self.failing_navigation.contains(url) {
            return Err(BrowserError::navigation(url, "net::ERR_CONNECTION_RESET"));
        }
        *lock(&self.current) = Some(url.to_string());
        lock(&self.visited).push(url.to_string());
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        if self
            .current_url()
            .is_some_and(|url| self.lost_session.contains(&url))
        {
            return Err(BrowserError::session("invalid session id"));
        }
        let ready = self.current_url().is_some_and(|url| {
            lock(&self.pages).get(&url).is_some_and(|page| {
                page.card_selector == selector && page.visible(page.queries) > 0
            })
        });
        if ready {
            return Ok(());
        }
        Err(BrowserError::WaitTimedOut {
            selector: selector.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        })
    }

    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<StubNode>> {
        let Some(url) = self.current_url() else {
            return Ok(Vec::new());
        };
        let mut pages = lock(&self.pages);
        let Some(page) = pages.get_mut(&url) else {
            return Ok(Vec::new());
        };
        if page.card_selector != selector {
            return Ok(Vec::new());
        }

        let count = page.visible(page.queries);
        page.queries += 1;
        Ok(page.cards[..count].to_vec())
    }

    async fn query_within(&self, parent: &StubNode, selector: &str) -> BrowserResult<Vec<StubNode>> {
        Self::card_of(parent, selector)?
            .nodes
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::query(selector, "no such node"))
    }

    async fn text_within(&self, parent: &StubNode, selector: &str) -> BrowserResult<String> {
        let (text, delay) = Self::card_of(parent, selector)?
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| BrowserError::query(selector, "no such node"))?;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(text)
    }

    async fn attribute(&self, element: &StubNode, name: &str) -> BrowserResult<Option<String>> {
        match element {
            StubNode::Link(href) if name == "href" => Ok(href.clone()),
            _ => Ok(None),
        }
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        lock(&self.clicks).push(selector.to_string());
        Ok(())
    }

    async fn execute(&self, script: &str) -> BrowserResult<()> {
        lock(&self.scripts).push(script.to_string());
        Ok(())
    }

    async fn close(&self) -> BrowserResult<()> {
        *lock(&self.closed) = true;
        Ok(())
    }
}

/// Card with the mandatory Wildberries fields
pub fn wb_card(title: &str, price: &str, href: &str) -> StubCard {
    StubCard::new()
        .text(".product-card__name", title)
        .text(".price__wrap", price)
        .link(".product-card__link", href)
}

/// Card with the mandatory Ozon fields
pub fn ozon_card(title: &str, price: &str, href: &str) -> StubCard {
    StubCard::new()
        .text(".tsBody500Medium", title)
        .text(".c3011-a0", price)
        .link(".tile-hover-target", href)
}

/// Card with the mandatory AliExpress fields
pub fn ali_card(title: &str, price: &str, href: &str) -> StubCard {
    StubCard::new()
        .text(".product-snippet_ProductSnippet__name__1mogfw", title)
        .text(".snow-price_SnowPrice__mainM__uw8t09", price)
        .link(".product-snippet_ProductSnippet__galleryBlock__1mogfw", href)
}
