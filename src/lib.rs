//! Catalog Crawler - headless-browser product listing scraper
//!
//! Drives a WebDriver-controlled Chrome through paginated category pages of
//! Wildberries, Ozon and AliExpress, scrolls each page until lazy-loaded
//! product cards stop appearing, extracts title/price/rating/review fields
//! and writes them to a timestamped CSV file.

// Module declarations
pub mod domain;
pub mod crawling;
pub mod infrastructure;
pub mod application;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export the pieces a binary needs
pub use application::{CatalogCrawlService, RunSummary};
pub use domain::{ProductCard, Site};
