//! One crawl run from browser launch to CSV file
//!
//! Owns the resources of a run: the optional chromedriver process and the
//! WebDriver session. Both are released whether the crawl succeeds, fails or
//! is cancelled.

use chrono::Local;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::crawling::{CatalogPaginator, CrawlReport, HaltReason, PaginatorConfig, SiteProfile};
use crate::domain::Site;
use crate::infrastructure::{
    AppConfig, BrowserSession, ChromeDriverProcess, CrawlError, CsvSink, WebDriverSession,
};

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub site: Site,
    pub products: usize,
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub halt: Option<HaltReason>,
    pub output: PathBuf,
}

impl RunSummary {
    fn from_report(site: Site, report: &CrawlReport, output: PathBuf) -> Self {
        Self {
            site,
            products: report.products.len(),
            pages_crawled: report.pages.len(),
            pages_failed: report.page_errors.len(),
            halt: report.halt.clone(),
            output,
        }
    }
}

pub struct CatalogCrawlService {
    paginator: CatalogPaginator,
    config: AppConfig,
}

impl CatalogCrawlService {
    pub fn new(site: Site, config: AppConfig) -> Self {
        Self::with_profile(SiteProfile::for_site(site), config)
    }

    pub fn with_profile(profile: SiteProfile, config: AppConfig) -> Self {
        let paginator = CatalogPaginator::new(profile, PaginatorConfig::from(&config.crawler));
        Self { paginator, config }
    }

    pub fn site(&self) -> Site {
        self.paginator.profile().site
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Launch the browser, crawl `url` and write the CSV
    pub async fn run(&self, url: &str, cancel: &CancellationToken) -> Result<RunSummary, CrawlError> {
        let driver = ChromeDriverProcess::spawn_if_configured(&self.config.browser).await?;

        let browser = match WebDriverSession::connect(&self.config.browser).await {
            Ok(browser) => browser,
            Err(e) => {
                if let Some(driver) = driver {
                    driver.shutdown().await;
                }
                return Err(CrawlError::BrowserLaunch(e.to_string()));
            }
        };

        let result = self.run_with_browser(&browser, url, cancel).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser session: {}", e);
        }
        if let Some(driver) = driver {
            driver.shutdown().await;
        }

        result
    }

    /// Crawl `url` with an already open browser and write the CSV.
    ///
    /// Nothing is written when the crawl is cancelled.
    pub async fn run_with_browser<B>(
        &self,
        browser: &B,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        let site = self.site();
        info!("🕷️  Starting {} crawl of {}", site, url);

        let report = self
            .paginator
            .paginate(browser, url, self.config.crawler.max_pages, cancel)
            .await?;

        let sink = CsvSink::new(&self.config.crawler.output_dir);
        let output = sink.write(site.key(), &report.products, &Local::now())?;

        Ok(RunSummary::from_report(site, &report, output))
    }
}
