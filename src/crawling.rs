//! Crawling module - the per-page pipeline shared by every site
//!
//! - `site_profile`: selectors, URL policy and normalizer of one marketplace
//! - `normalizer`: raw card text to clean field values
//! - `scroller`: scroll until lazy-loaded cards stop appearing
//! - `extractor`: card element to `ProductCard`
//! - `paginator`: page loop with per-page error accounting
//! - `report`: what a crawl collected and where it failed

pub mod extractor;
pub mod normalizer;
pub mod paginator;
pub mod report;
pub mod scroller;
pub mod site_profile;

pub use extractor::{CardSkip, ExtractorConfig, FieldExtractor, PageExtraction};
pub use normalizer::{AliExpressNormalizer, CardNormalizer, OzonNormalizer, WildberriesNormalizer};
pub use paginator::{CatalogPaginator, FailurePolicy, PaginatorConfig};
pub use report::{CrawlReport, HaltReason, PageError, PageFailure, PageReport};
pub use scroller::{LazyLoadScroller, ScrollConfig, ScrollOutcome};
pub use site_profile::{CardSelectors, SiteProfile};
