//! Application layer - wiring a crawl run and the command line
//!
//! - `crawl_service`: browser lifecycle, pagination and CSV output of one run
//! - `cli`: flag parsing, config/logging bootstrap and Ctrl-C handling

pub mod cli;
pub mod crawl_service;

pub use cli::Cli;
pub use crawl_service::{CatalogCrawlService, RunSummary};
