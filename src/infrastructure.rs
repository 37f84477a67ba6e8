//! Infrastructure layer for browser automation, configuration and output
//!
//! This module provides the browser capability trait and its WebDriver
//! backend, the chromedriver process launcher, configuration loading,
//! logging setup and the CSV sink.

pub mod browser;
pub mod chromedriver;
pub mod config;
pub mod csv_sink;
pub mod error;
pub mod logging;
pub mod webdriver;

// Re-export commonly used items
pub use browser::{BrowserResult, BrowserSession};
pub use chromedriver::ChromeDriverProcess;
pub use config::{AppConfig, BrowserConfig, ConfigManager, CrawlerConfig, LoggingConfig};
pub use csv_sink::CsvSink;
pub use error::{BrowserError, CrawlError, SinkError};
pub use logging::{init_logging, init_logging_with_config};
pub use webdriver::WebDriverSession;
