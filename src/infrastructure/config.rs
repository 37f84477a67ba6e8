//! Configuration infrastructure
//!
//! Configuration is organized into three sections:
//! 1. Crawler settings (pagination, scroll bounds, read timeouts)
//! 2. Browser settings (WebDriver endpoint, chromedriver process, Chrome flags)
//! 3. Logging settings
//!
//! Every section is `#[serde(default)]`, so a config file only needs the keys
//! it wants to override. CLI flags are applied on top of the loaded file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Default values shared by the config structs and the CLI
pub mod defaults {
    /// Pages crawled when `--pages` is not given
    pub const MAX_PAGES: u32 = 30;
    pub const OUTPUT_DIR: &str = "output";

    /// Title, price and link are read together under this budget
    pub const MANDATORY_TIMEOUT_MS: u64 = 500;
    /// Rating and review reads each get this budget
    pub const OPTIONAL_TIMEOUT_MS: u64 = 100;
    /// How long a freshly loaded page may take to show its first card
    pub const PAGE_READY_TIMEOUT_MS: u64 = 15_000;
    pub const PAGE_DELAY_MS: u64 = 0;

    pub const SCROLL_SETTLE_DELAY_MS: u64 = 500;
    pub const SCROLL_MAX_ITERATIONS: u32 = 50;
    pub const SCROLL_MAX_DURATION_MS: u64 = 60_000;

    /// 1.0 never trips: every page may fail without halting the crawl
    pub const MAX_FAILURE_RATIO: f64 = 1.0;
    pub const FAILURE_MIN_PAGES: u32 = 3;

    pub const WEBDRIVER_URL: &str = "http://localhost:9515";
    pub const CHROMEDRIVER_PORT: u16 = 9515;
    pub const DRIVER_STARTUP_DELAY_MS: u64 = 2_000;
    pub const POLL_INTERVAL_MS: u64 = 50;
    pub const HEADLESS: bool = true;
    pub const WINDOW_WIDTH: u32 = 1920;
    pub const WINDOW_HEIGHT: u32 = 1080;

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_FILE_NAME: &str = "catalog-crawler.log";

    pub const CONFIG_DIR_NAME: &str = "catalog-crawler";
    pub const CONFIG_FILE_NAME: &str = "config.json";
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    pub logging: LoggingConfig,
}

/// Crawl behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum catalog pages to visit
    pub max_pages: u32,

    /// Directory the CSV file is written to
    pub output_dir: String,

    /// Budget for the mandatory title/price/link batch per card
    pub mandatory_timeout_ms: u64,

    /// Budget for each optional rating/review read
    pub optional_timeout_ms: u64,

    /// Budget for the first card to appear after navigation
    pub page_ready_timeout_ms: u64,

    /// Pause between two catalog pages
    pub page_delay_ms: u64,

    /// Wait after each scroll for lazy content to render
    pub scroll_settle_delay_ms: u64,

    /// Scroll rounds before giving up on stabilization
    pub scroll_max_iterations: u32,

    /// Wall-clock budget for stabilization of one page
    pub scroll_max_duration_ms: u64,

    /// Halt once failed/attempted pages exceeds this ratio
    pub max_failure_ratio: f64,

    /// Pages attempted before the failure ratio is evaluated
    pub failure_min_pages: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: defaults::MAX_PAGES,
            output_dir: defaults::OUTPUT_DIR.to_string(),
            mandatory_timeout_ms: defaults::MANDATORY_TIMEOUT_MS,
            optional_timeout_ms: defaults::OPTIONAL_TIMEOUT_MS,
            page_ready_timeout_ms: defaults::PAGE_READY_TIMEOUT_MS,
            page_delay_ms: defaults::PAGE_DELAY_MS,
            scroll_settle_delay_ms: defaults::SCROLL_SETTLE_DELAY_MS,
            scroll_max_iterations: defaults::SCROLL_MAX_ITERATIONS,
            scroll_max_duration_ms: defaults::SCROLL_MAX_DURATION_MS,
            max_failure_ratio: defaults::MAX_FAILURE_RATIO,
            failure_min_pages: defaults::FAILURE_MIN_PAGES,
        }
    }
}

impl CrawlerConfig {
    pub fn mandatory_timeout(&self) -> Duration {
        Duration::from_millis(self.mandatory_timeout_ms)
    }

    pub fn optional_timeout(&self) -> Duration {
        Duration::from_millis(self.optional_timeout_ms)
    }

    pub fn page_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.page_ready_timeout_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn scroll_settle_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_delay_ms)
    }

    pub fn scroll_max_duration(&self) -> Duration {
        Duration::from_millis(self.scroll_max_duration_ms)
    }
}

/// Browser and WebDriver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint the session connects to
    pub webdriver_url: String,

    /// When set, this chromedriver binary is spawned for the run
    pub chromedriver_path: Option<String>,

    /// Port passed to a spawned chromedriver
    pub chromedriver_port: u16,

    /// Wait after spawning chromedriver before connecting
    pub driver_startup_delay_ms: u64,

    /// Interval between node lookups while waiting for an element
    pub poll_interval_ms: u64,

    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    pub user_agent: Option<String>,

    /// Additional Chrome command-line switches
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: defaults::WEBDRIVER_URL.to_string(),
            chromedriver_path: None,
            chromedriver_port: defaults::CHROMEDRIVER_PORT,
            driver_startup_delay_ms: defaults::DRIVER_STARTUP_DELAY_MS,
            poll_interval_ms: defaults::POLL_INTERVAL_MS,
            headless: defaults::HEADLESS,
            window_width: defaults::WINDOW_WIDTH,
            window_height: defaults::WINDOW_HEIGHT,
            user_agent: None,
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    pub fn driver_startup_delay(&self) -> Duration {
        Duration::from_millis(self.driver_startup_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// WebDriver endpoint, pointing at the spawned driver when one is configured
    pub fn effective_webdriver_url(&self) -> String {
        if self.chromedriver_path.is_some() {
            format!("http://localhost:{}", self.chromedriver_port)
        } else {
            self.webdriver_url.clone()
        }
    }
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for log files; defaults to `logs/` next to the executable
    pub log_dir: Option<String>,

    /// Module-specific log level filters (e.g., "thirtyfour": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            log_dir: None,
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("thirtyfour".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("hyper_util".to_string(), "warn".to_string());
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Get the application configuration directory
    pub fn get_config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join(defaults::CONFIG_DIR_NAME);

        Ok(config_dir)
    }

    /// Manager for the per-user config file
    pub fn new() -> Result<Self> {
        let config_path = Self::get_config_dir()?.join(defaults::CONFIG_FILE_NAME);
        Ok(Self { config_path })
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Explicit path when given, otherwise the per-user file
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::with_path(path)),
            None => Self::new(),
        }
    }

    /// Load configuration from file; a missing file yields defaults
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !self.config_path.exists() {
            info!(
                "Configuration file not found, using defaults: {:?}",
                self.config_path
            );
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("Invalid configuration file {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration as pretty JSON, creating the directory if needed
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create config directory {dir:?}"))?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;
        fs::write(&self.config_path, content)
            .await
            .with_context(|| format!("Failed to write configuration file {:?}", self.config_path))?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }
}
