//! Lazy-load scroll stabilization
//!
//! Catalog pages render more cards as the window nears the bottom. The
//! scroller repeats scroll-to-bottom, waits for rendering, and re-queries
//! the card selector until two consecutive queries return the same count.
//!
//! Stabilization compares counts, not identities: a page that swaps cards
//! for the same number of new ones looks stable. The listing pages crawled
//! here only append, so the count is enough.
//!
//! Each page is bounded by an iteration cap and a wall-clock budget; hitting
//! either returns the latest cards with `stabilized = false`.

use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::infrastructure::browser::{BrowserResult, BrowserSession, SCROLL_TO_BOTTOM_SCRIPT};
use crate::infrastructure::config::CrawlerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Pause after each scroll for lazy content to render
    pub settle_delay: Duration,
    pub max_iterations: u32,
    pub max_duration: Duration,
}

impl From<&CrawlerConfig> for ScrollConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            settle_delay: config.scroll_settle_delay(),
            max_iterations: config.scroll_max_iterations,
            max_duration: config.scroll_max_duration(),
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct ScrollOutcome<E> {
    /// Cards from the last query, in document order
    pub elements: Vec<E>,
    /// Scroll rounds performed
    pub iterations: u32,
    /// False when a bound or a failed re-query ended the loop early
    pub stabilized: bool,
}

pub struct LazyLoadScroller {
    config: ScrollConfig,
    pre_scroll_click: Option<String>,
}

impl LazyLoadScroller {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            pre_scroll_click: None,
        }
    }

    /// Click `selector` (best effort) before every scroll round
    pub fn with_pre_scroll_click(mut self, selector: Option<String>) -> Self {
        self.pre_scroll_click = selector;
        self
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    /// Scroll until the number of `card_selector` matches stops growing.
    ///
    /// Only the initial query can fail; later query failures end the loop
    /// with the last good result.
    pub async fn stabilize<B>(
        &self,
        browser: &B,
        card_selector: &str,
    ) -> BrowserResult<ScrollOutcome<B::Element>>
    where
        B: BrowserSession + ?Sized,
    {
        let started = Instant::now();
        let mut elements = browser.query_all(card_selector).await?;
        let mut iterations = 0;

        loop {
            if iterations >= self.config.max_iterations {
                warn!(
                    "⚠️  Card count for '{}' still changing after {} scroll rounds, keeping {} cards",
                    card_selector,
                    iterations,
                    elements.len()
                );
                return Ok(Self::unsettled(elements, iterations));
            }
            if started.elapsed() >= self.config.max_duration {
                warn!(
                    "⚠️  Scrolling '{}' exceeded {:?}, keeping {} cards",
                    card_selector,
                    self.config.max_duration,
                    elements.len()
                );
                return Ok(Self::unsettled(elements, iterations));
            }

            self.scroll_once(browser).await;
            iterations += 1;

            let previous = elements.len();
            match browser.query_all(card_selector).await {
                Ok(current) => elements = current,
                Err(e) => {
                    warn!("Re-query of '{}' failed, keeping {} cards: {}", card_selector, previous, e);
                    return Ok(Self::unsettled(elements, iterations));
                }
            }

            debug!("Scroll round {}: {} -> {} cards", iterations, previous, elements.len());
            if elements.len() == previous {
                return Ok(ScrollOutcome {
                    elements,
                    iterations,
                    stabilized: true,
                });
            }
        }
    }

    async fn scroll_once<B>(&self, browser: &B)
    where
        B: BrowserSession + ?Sized,
    {
        if let Some(selector) = &self.pre_scroll_click {
            if let Err(e) = browser.click(selector).await {
                debug!("Pre-scroll click on '{}' failed: {}", selector, e);
            }
        }
        if let Err(e) = browser.execute(SCROLL_TO_BOTTOM_SCRIPT).await {
            debug!("Scroll script failed: {}", e);
        }
        tokio::time::sleep(self.config.settle_delay).await;
    }

    fn unsettled<E>(elements: Vec<E>, iterations: u32) -> ScrollOutcome<E> {
        ScrollOutcome {
            elements,
            iterations,
            stabilized: false,
        }
    }
}
