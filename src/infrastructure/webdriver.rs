//! WebDriver backend for the browser capability set
//!
//! Connects to chromedriver (or any W3C WebDriver endpoint serving Chrome)
//! through `thirtyfour`. Lookups that must wait for a node poll at the
//! configured interval until the node exists.

use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::fantoccini::error::CmdError;
use thirtyfour::ChromeCapabilities;
use thirtyfour::prelude::*;
use tracing::{debug, info};

use super::browser::{BrowserResult, BrowserSession};
use super::config::BrowserConfig;
use super::error::BrowserError;

pub struct WebDriverSession {
    driver: WebDriver,
    poll_interval: Duration,
}

impl WebDriverSession {
    /// Open a Chrome session on the configured WebDriver endpoint
    pub async fn connect(config: &BrowserConfig) -> BrowserResult<Self> {
        let caps = Self::capabilities(config).map_err(BrowserError::session)?;
        let url = config.effective_webdriver_url();

        info!("🌐 Connecting to WebDriver at {}", url);
        let driver = WebDriver::new(&url, caps)
            .await
            .map_err(|e| BrowserError::session(format!("failed to connect to {url}: {e}")))?;

        Ok(Self {
            driver,
            poll_interval: config.poll_interval(),
        })
    }

    fn capabilities(config: &BrowserConfig) -> WebDriverResult<ChromeCapabilities> {
        let mut caps = DesiredCapabilities::chrome();
        if config.headless {
            caps.set_headless()?;
        }
        caps.set_no_sandbox()?;
        caps.set_disable_dev_shm_usage()?;
        caps.add_chrome_arg("--disable-blink-features=AutomationControlled")?;
        caps.add_chrome_arg(&format!(
            "--window-size={},{}",
            config.window_width, config.window_height
        ))?;
        if let Some(user_agent) = &config.user_agent {
            caps.add_chrome_arg(&format!("--user-agent={user_agent}"))?;
        }
        for arg in &config.extra_args {
            caps.add_chrome_arg(arg)?;
        }
        Ok(caps)
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        debug!("Navigating to {}", url);
        self.driver
            .goto(url)
            .await
            .map_err(|e| BrowserError::navigation(url, e))
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> BrowserResult<()> {
        let found = tokio::time::timeout(timeout, async {
            loop {
                match self.driver.find_all(By::Css(selector)).await {
                    Ok(elements) if !elements.is_empty() => return Ok(()),
                    Ok(_) => {}
                    Err(e) => match DriverFailure::of(&e) {
                        DriverFailure::Missing | DriverFailure::Other => {}
                        DriverFailure::SessionLost => return Err(BrowserError::session(e)),
                    },
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        })
        .await;

        found.unwrap_or_else(|_| {
            Err(BrowserError::WaitTimedOut {
                selector: selector.to_string(),
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            })
        })
    }

    async fn query_all(&self, selector: &str) -> BrowserResult<Vec<WebElement>> {
        self.driver
            .find_all(By::Css(selector))
            .await
            .map_err(|e| driver_error(selector, e))
    }

    async fn query_within(
        &self,
        parent: &WebElement,
        selector: &str,
    ) -> BrowserResult<Vec<WebElement>> {
        parent
            .find_all(By::Css(selector))
            .await
            .map_err(|e| driver_error(selector, e))
    }

    async fn text_within(&self, parent: &WebElement, selector: &str) -> BrowserResult<String> {
        let element = loop {
            match parent.find(By::Css(selector)).await {
                Ok(element) => break element,
                Err(e) if DriverFailure::of(&e) == DriverFailure::Missing => {
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(driver_error(selector, e)),
            }
        };

        element.text().await.map_err(|e| driver_error(selector, e))
    }

    async fn attribute(&self, element: &WebElement, name: &str) -> BrowserResult<Option<String>> {
        element.attr(name).await.map_err(|e| driver_error(name, e))
    }

    async fn click(&self, selector: &str) -> BrowserResult<()> {
        let element = self
            .driver
            .find(By::Css(selector))
            .await
            .map_err(|e| driver_error(selector, e))?;
        element.click().await.map_err(|e| driver_error(selector, e))
    }

    async fn execute(&self, script: &str) -> BrowserResult<()> {
        self.driver
            .execute(script, Vec::new())
            .await
            .map(|_| ())
            .map_err(|e| match DriverFailure::of(&e) {
                DriverFailure::SessionLost => BrowserError::session(e),
                DriverFailure::Missing | DriverFailure::Other => BrowserError::ScriptFailed {
                    reason: e.to_string(),
                },
            })
    }

    async fn close(&self) -> BrowserResult<()> {
        info!("Closing browser session");
        self.driver
            .clone()
            .quit()
            .await
            .map_err(BrowserError::session)
    }
}

/// How a WebDriver command failed, as far as the crawl cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverFailure {
    /// No node matched (also reported for stale nodes)
    Missing,
    /// The browser window, session or driver connection is gone
    SessionLost,
    Other,
}

impl DriverFailure {
    fn of(error: &WebDriverError) -> Self {
        match error {
            WebDriverError::NoSuchElement(_) => Self::Missing,
            WebDriverError::NoSuchWindow(_)
            | WebDriverError::NewSessionError(_)
            | WebDriverError::IoError(_) => Self::SessionLost,
            WebDriverError::CmdError(CmdError::Lost(_) | CmdError::Failed(_)) => Self::SessionLost,
            WebDriverError::CmdError(CmdError::Standard(e)) if e.error() == "invalid session id" => {
                Self::SessionLost
            }
            _ => Self::Other,
        }
    }
}

/// Session-level failures become `Session`, everything else stays scoped to
/// the selector
fn driver_error(selector: &str, error: WebDriverError) -> BrowserError {
    match DriverFailure::of(&error) {
        DriverFailure::SessionLost => BrowserError::session(error),
        DriverFailure::Missing | DriverFailure::Other => BrowserError::query(selector, error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_node_is_scoped_to_selector() {
        let error = driver_error(".card", WebDriverError::NoSuchElement("gone".into()));
        assert!(matches!(error, BrowserError::QueryFailed { ref selector, .. } if selector == ".card"));
        assert!(!error.is_fatal());
    }

    #[test]
    fn test_closed_window_is_a_lost_session() {
        let error = driver_error(".card", WebDriverError::NoSuchWindow("closed".into()));
        assert!(matches!(error, BrowserError::Session { .. }));
        assert!(error.is_fatal());
    }

    #[test]
    fn test_driver_connection_error_is_a_lost_session() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(DriverFailure::of(&WebDriverError::IoError(io)), DriverFailure::SessionLost);
    }

    #[test]
    fn test_other_errors_are_not_fatal() {
        assert_eq!(
            DriverFailure::of(&WebDriverError::Timeout("slow".into())),
            DriverFailure::Other
        );
        assert!(!driver_error("a", WebDriverError::CustomError("x".into())).is_fatal());
    }
}
