//! Error types for browser, crawl and output operations
//!
//! Browser errors are cheap to clone so they can be stored in per-page
//! reports after being logged.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailed { url: String, reason: String },

    #[error("No element matched '{selector}' within {timeout_ms}ms")]
    WaitTimedOut { selector: String, timeout_ms: u64 },

    #[error("Query '{selector}' failed: {reason}")]
    QueryFailed { selector: String, reason: String },

    #[error("Script execution failed: {reason}")]
    ScriptFailed { reason: String },

    #[error("Browser session error: {message}")]
    Session { message: String },
}

impl BrowserError {
    pub fn navigation(url: &str, reason: impl ToString) -> Self {
        Self::NavigationFailed {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn query(selector: &str, reason: impl ToString) -> Self {
        Self::QueryFailed {
            selector: selector.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn session(message: impl ToString) -> Self {
        Self::Session {
            message: message.to_string(),
        }
    }

    /// Navigation failures end the whole run; everything else is scoped to
    /// the page, card or field that raised it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NavigationFailed { .. } | Self::Session { .. })
    }
}

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to prepare output at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Browser launch failed: {0}")]
    BrowserLaunch(String),

    #[error(transparent)]
    Sink(#[from] SinkError),
}
