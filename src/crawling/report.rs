//! Result of a pagination run
//!
//! A run always carries the products it collected. Per-page failures and the
//! reason pagination stopped early sit beside them, so the caller decides
//! what to do with a partial result.

use std::fmt;

use crate::domain::ProductCard;
use crate::infrastructure::error::BrowserError;

/// Outcome of one successfully processed page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageReport {
    pub page: u32,
    pub url: String,
    /// Cards matched after scrolling settled
    pub cards_found: usize,
    pub extracted: usize,
    pub skipped: usize,
    pub scroll_iterations: u32,
    pub stabilized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageFailure {
    /// The browser reported an error while processing the page
    Browser(BrowserError),
    /// The listing rendered without any product cards
    NoCards,
}

impl fmt::Display for PageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser(e) => write!(f, "{e}"),
            Self::NoCards => f.write_str("no product cards on page"),
        }
    }
}

/// A page that produced no products
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageError {
    pub page: u32,
    pub url: String,
    pub failure: PageFailure,
}

/// Why pagination stopped before `max_pages`
#[derive(Debug, Clone, PartialEq)]
pub enum HaltReason {
    /// Navigation to `page` failed
    Navigation { page: u32, error: BrowserError },
    /// The browser session became unusable while on `page`
    SessionLost { page: u32, error: BrowserError },
    FailureRateExceeded { failed: usize, attempted: usize },
}

impl fmt::Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Navigation { page, error } => write!(f, "page {page}: {error}"),
            Self::SessionLost { page, error } => write!(f, "session lost on page {page}: {error}"),
            Self::FailureRateExceeded { failed, attempted } => {
                write!(f, "{failed} of {attempted} pages failed")
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Every extracted card, in page order then card order
    pub products: Vec<ProductCard>,
    pub pages: Vec<PageReport>,
    pub page_errors: Vec<PageError>,
    pub halt: Option<HaltReason>,
}

impl CrawlReport {
    /// Pages navigated to, whether or not they produced products
    pub fn pages_attempted(&self) -> usize {
        self.pages.len() + self.page_errors.len()
    }

    pub fn is_complete(&self) -> bool {
        self.halt.is_none() && self.page_errors.is_empty()
    }

    /// Share of attempted pages that failed, 0.0 before any page
    pub fn failure_ratio(&self) -> f64 {
        let attempted = self.pages_attempted();
        if attempted == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.page_errors.len() as f64 / attempted as f64;
        ratio
    }
}
