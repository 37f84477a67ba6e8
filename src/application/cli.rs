//! Command line entry shared by the per-site binaries
//!
//! Flags override the JSON config file, which overrides built-in defaults.
//! The process reports failures through the log and still exits 0; the
//! elapsed time in seconds is printed to stdout at the end.

use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::crawl_service::CatalogCrawlService;
use crate::domain::Site;
use crate::infrastructure::logging::log_system_info;
use crate::infrastructure::{AppConfig, ConfigManager, init_logging_with_config};

#[derive(Parser, Debug)]
#[command(version)]
pub struct Cli {
    /// Category listing URL (defaults to the site's built-in category)
    #[arg(long)]
    pub url: Option<String>,

    /// Maximum number of catalog pages to crawl
    #[arg(long)]
    pub pages: Option<u32>,

    /// Output directory for the CSV file, created if absent
    #[arg(long)]
    pub output: Option<String>,

    /// Configuration file path (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// WebDriver endpoint, e.g. http://localhost:9515
    #[arg(long)]
    pub webdriver: Option<String>,

    /// Show the browser window
    #[arg(long)]
    pub no_headless: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// Apply flag values on top of the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(pages) = self.pages {
            config.crawler.max_pages = pages;
        }
        if let Some(output) = &self.output {
            config.crawler.output_dir.clone_from(output);
        }
        if let Some(webdriver) = &self.webdriver {
            config.browser.webdriver_url.clone_from(webdriver);
        }
        if self.no_headless {
            config.browser.headless = false;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }

    pub fn url_for(&self, site: Site) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| site.default_url().to_string())
    }
}

/// Parse the command line and crawl `site`
pub async fn run(site: Site) -> Result<()> {
    let cli = Cli::parse();
    run_with(site, cli).await
}

/// Configuration to run with and where it came from
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// Config file that was read, `None` when defaults are used
    pub source: Option<PathBuf>,
    /// Why the config file could not be used
    pub error: Option<anyhow::Error>,
}

impl LoadedConfig {
    /// Log the outcome; call once the log subscriber is installed
    pub fn report(&self) {
        match (&self.error, &self.source) {
            (Some(e), _) => {
                warn!("⚠️  {:#}", e);
                warn!("⚠️  Falling back to default configuration");
            }
            (None, Some(path)) => info!("Loaded configuration from: {:?}", path),
            (None, None) => info!("No configuration file, using defaults"),
        }
    }
}

/// Load the config file without failing: any error yields defaults and is
/// kept for `LoadedConfig::report`
pub async fn load_config(explicit: Option<&Path>) -> LoadedConfig {
    let manager = match ConfigManager::resolve(explicit) {
        Ok(manager) => manager,
        Err(error) => {
            return LoadedConfig {
                config: AppConfig::default(),
                source: None,
                error: Some(error),
            };
        }
    };

    let exists = manager.config_path.exists();
    match manager.load_config().await {
        Ok(config) => LoadedConfig {
            config,
            source: exists.then(|| manager.config_path.clone()),
            error: None,
        },
        Err(error) => LoadedConfig {
            config: AppConfig::default(),
            source: None,
            error: Some(error),
        },
    }
}

pub async fn run_with(site: Site, cli: Cli) -> Result<()> {
    let started = Instant::now();

    let mut loaded = load_config(cli.config.as_deref()).await;
    cli.apply_overrides(&mut loaded.config);

    if let Err(e) = init_logging_with_config(&loaded.config.logging) {
        eprintln!("Logging unavailable: {e:#}");
    }
    log_system_info();
    loaded.report();
    let config = loaded.config;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("🛑 Interrupt received, stopping crawl");
            ctrl_c.cancel();
        }
    });

    let url = cli.url_for(site);
    let service = CatalogCrawlService::new(site, config);
    match service.run(&url, &cancel).await {
        Ok(summary) => {
            info!(
                "🎉 {} products from {} pages written to {}",
                summary.products,
                summary.pages_crawled,
                summary.output.display()
            );
            if summary.pages_failed > 0 {
                warn!("⚠️  {} pages produced no products", summary.pages_failed);
            }
            if let Some(reason) = &summary.halt {
                warn!("⚠️  Crawl stopped early: {}", reason);
            }
        }
        Err(e) => error!("❌ {} crawl failed: {}", site, e),
    }

    println!("{:.2}", started.elapsed().as_secs_f64());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "wb",
            "--pages",
            "5",
            "--output",
            "/tmp/out",
            "--webdriver",
            "http://remote:4444",
            "--no-headless",
            "--log-level",
            "debug",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.crawler.max_pages, 5);
        assert_eq!(config.crawler.output_dir, "/tmp/out");
        assert_eq!(config.browser.webdriver_url, "http://remote:4444");
        assert!(!config.browser.headless);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_absent_flags_keep_config() {
        let cli = Cli::parse_from(["ozon"]);
        let mut config = AppConfig::default();
        config.crawler.max_pages = 7;
        cli.apply_overrides(&mut config);

        assert_eq!(config.crawler.max_pages, 7);
        assert!(config.browser.headless);
        assert_eq!(cli.url_for(Site::Ozon), Site::Ozon.default_url());
    }

    #[tokio::test]
    async fn test_broken_config_falls_back_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = load_config(Some(&path)).await;

        assert!(loaded.error.is_some());
        assert!(loaded.source.is_none());
        assert_eq!(loaded.config.crawler.max_pages, AppConfig::default().crawler.max_pages);
    }

    #[tokio::test]
    async fn test_missing_config_file_uses_defaults_quietly() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.json"))).await;

        assert!(loaded.error.is_none());
        assert!(loaded.source.is_none());
        assert!(loaded.config.browser.headless);
    }

    #[tokio::test]
    async fn test_valid_config_records_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "crawler": { "max_pages": 4 } }"#).unwrap();

        let loaded = load_config(Some(&path)).await;

        assert!(loaded.error.is_none());
        assert_eq!(loaded.source.as_deref(), Some(path.as_path()));
        assert_eq!(loaded.config.crawler.max_pages, 4);
    }

    #[test]
    fn test_url_flag_wins_over_default() {
        let cli = Cli::parse_from(["ali", "--url", "https://aliexpress.ru/category/1"]);
        assert_eq!(cli.url_for(Site::AliExpress), "https://aliexpress.ru/category/1");
    }
}
