//! Catalog pagination
//!
//! Visits pages `1..=max_pages` of a category listing one after another:
//! navigate, wait for the first card, scroll until the listing settles,
//! extract every card. Products accumulate across pages in order.
//!
//! A failed navigation or a lost browser session stops pagination but keeps
//! what was collected. A page whose cards never appear is recorded and
//! skipped. Cancellation aborts the run with `CrawlError::Cancelled`.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::extractor::{ExtractorConfig, FieldExtractor};
use super::report::{CrawlReport, HaltReason, PageError, PageFailure, PageReport};
use super::scroller::{LazyLoadScroller, ScrollConfig};
use super::site_profile::SiteProfile;
use crate::domain::{ProductCard, build_page_url};
use crate::infrastructure::browser::BrowserSession;
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::error::{BrowserError, CrawlError};

/// Halts pagination once too many pages fail
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailurePolicy {
    /// Failed/attempted ratio that must be exceeded to halt; 1.0 never halts
    pub max_failure_ratio: f64,
    /// Pages attempted before the ratio is evaluated
    pub min_pages: usize,
}

impl FailurePolicy {
    pub fn should_halt(&self, failed: usize, attempted: usize) -> bool {
        if attempted == 0 || attempted < self.min_pages {
            return false;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = failed as f64 / attempted as f64;
        ratio > self.max_failure_ratio
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for FailurePolicy {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_failure_ratio: config.max_failure_ratio,
            min_pages: config.failure_min_pages as usize,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaginatorConfig {
    /// Budget for the first card to appear after navigation
    pub page_ready_timeout: Duration,
    pub page_delay: Duration,
    pub failure_policy: FailurePolicy,
    pub scroll: ScrollConfig,
    pub extractor: ExtractorConfig,
}

impl From<&CrawlerConfig> for PaginatorConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            page_ready_timeout: config.page_ready_timeout(),
            page_delay: config.page_delay(),
            failure_policy: FailurePolicy::from(config),
            scroll: ScrollConfig::from(config),
            extractor: ExtractorConfig::from(config),
        }
    }
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

enum PageOutcome {
    /// Products of the page, plus a halt when the session died mid-page
    Done(PageReport, Vec<ProductCard>, Option<HaltReason>),
    Failed(PageFailure),
    Halted(HaltReason),
}

pub struct CatalogPaginator {
    profile: SiteProfile,
    config: PaginatorConfig,
    scroller: LazyLoadScroller,
}

impl CatalogPaginator {
    pub fn new(profile: SiteProfile, config: PaginatorConfig) -> Self {
        let scroller =
            LazyLoadScroller::new(config.scroll).with_pre_scroll_click(profile.pre_scroll_click.clone());
        Self {
            profile,
            config,
            scroller,
        }
    }

    pub fn profile(&self) -> &SiteProfile {
        &self.profile
    }

    /// Crawl `max_pages` pages of `base_url`.
    ///
    /// Returns `Err` only on cancellation; browser failures end up in the
    /// report next to the products collected so far.
    pub async fn paginate<B>(
        &self,
        browser: &B,
        base_url: &str,
        max_pages: u32,
        cancel: &CancellationToken,
    ) -> Result<CrawlReport, CrawlError>
    where
        B: BrowserSession + ?Sized,
    {
        info!("📄 Crawling {} pages of {} ({})", max_pages, base_url, self.profile.site);
        let mut report = CrawlReport::default();

        for page in 1..=max_pages {
            if cancel.is_cancelled() {
                warn!("🛑 Crawl cancelled before page {}", page);
                return Err(CrawlError::Cancelled);
            }

            let url = build_page_url(base_url, page, self.profile.first_page);
            let outcome = tokio::select! {
                outcome = self.crawl_page(browser, page, &url) => outcome,
                () = cancel.cancelled() => {
                    warn!("🛑 Crawl cancelled on page {}", page);
                    return Err(CrawlError::Cancelled);
                }
            };

            match outcome {
                PageOutcome::Done(page_report, products, halt) => {
                    info!(
                        "✅ Page {}: {} products ({} cards, {} skipped)",
                        page, page_report.extracted, page_report.cards_found, page_report.skipped
                    );
                    report.products.extend(products);
                    report.pages.push(page_report);
                    if let Some(reason) = halt {
                        error!("❌ Pagination halted: {}", reason);
                        report.halt = Some(reason);
                        break;
                    }
                }
                PageOutcome::Failed(failure) => {
                    warn!("⚠️  Page {} skipped: {}", page, failure);
                    report.page_errors.push(PageError { page, url, failure });
                }
                PageOutcome::Halted(reason) => {
                    error!("❌ Pagination halted: {}", reason);
                    report.halt = Some(reason);
                    break;
                }
            }

            let failed = report.page_errors.len();
            let attempted = report.pages_attempted();
            if self.config.failure_policy.should_halt(failed, attempted) {
                let reason = HaltReason::FailureRateExceeded { failed, attempted };
                error!("❌ Pagination halted: {}", reason);
                report.halt = Some(reason);
                break;
            }

            if page < max_pages && !self.config.page_delay.is_zero() {
                tokio::select! {
                    () = tokio::time::sleep(self.config.page_delay) => {},
                    () = cancel.cancelled() => {
                        warn!("🛑 Crawl cancelled during page delay");
                        return Err(CrawlError::Cancelled);
                    }
                }
            }
        }

        info!(
            "📊 Collected {} products from {} pages ({} failed)",
            report.products.len(),
            report.pages.len(),
            report.page_errors.len()
        );
        Ok(report)
    }

    async fn crawl_page<B>(&self, browser: &B, page: u32, url: &str) -> PageOutcome
    where
        B: BrowserSession + ?Sized,
    {
        if let Err(error) = browser.navigate(url).await {
            return PageOutcome::Halted(HaltReason::Navigation { page, error });
        }

        let card_selector = &self.profile.selectors.card;
        if let Err(e) = browser
            .wait_for(card_selector, self.config.page_ready_timeout)
            .await
        {
            return Self::browser_failure(page, e);
        }

        let scrolled = match self.scroller.stabilize(browser, card_selector).await {
            Ok(outcome) => outcome,
            Err(e) => return Self::browser_failure(page, e),
        };
        if scrolled.elements.is_empty() {
            return PageOutcome::Failed(PageFailure::NoCards);
        }

        let extraction = FieldExtractor::new(&self.profile, self.config.extractor)
            .extract_all(browser, &scrolled.elements)
            .await;

        let page_report = PageReport {
            page,
            url: url.to_string(),
            cards_found: scrolled.elements.len(),
            extracted: extraction.cards.len(),
            skipped: extraction.skipped.len(),
            scroll_iterations: scrolled.iterations,
            stabilized: scrolled.stabilized,
        };
        let halt = extraction
            .fatal
            .map(|error| HaltReason::SessionLost { page, error });
        PageOutcome::Done(page_report, extraction.cards, halt)
    }

    fn browser_failure(page: u32, error: BrowserError) -> PageOutcome {
        match error {
            BrowserError::NavigationFailed { .. } => {
                PageOutcome::Halted(HaltReason::Navigation { page, error })
            }
            e if e.is_fatal() => PageOutcome::Halted(HaltReason::SessionLost { page, error: e }),
            e => PageOutcome::Failed(PageFailure::Browser(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{StubBrowser, StubPage, wb_card};
    use rstest::rstest;

    const BASE: &str = "https://www.wildberries.ru/catalog/boxes";

    fn fast_config() -> PaginatorConfig {
        PaginatorConfig {
            page_ready_timeout: Duration::from_millis(50),
            page_delay: Duration::ZERO,
            failure_policy: FailurePolicy {
                max_failure_ratio: 1.0,
                min_pages: 3,
            },
            scroll: ScrollConfig {
                settle_delay: Duration::ZERO,
                max_iterations: 10,
                max_duration: Duration::from_secs(5),
            },
            extractor: ExtractorConfig {
                mandatory_timeout: Duration::from_millis(200),
                optional_timeout: Duration::from_millis(20),
            },
        }
    }

    fn wb_page(titles: &[&str]) -> StubPage {
        let cards = titles
            .iter()
            .enumerate()
            .map(|(i, title)| wb_card(title, "100 ₽", &format!("https://www.wildberries.ru/catalog/{i}/detail.aspx")))
            .collect();
        StubPage::new(".product-card", cards)
    }

    fn paginator() -> CatalogPaginator {
        CatalogPaginator::new(SiteProfile::wildberries(), fast_config())
    }

    #[rstest]
    #[case(0, 1, false)]
    #[case(1, 2, false)]
    #[case(3, 3, false)]
    #[case(2, 3, false)]
    fn test_default_policy_never_halts(#[case] failed: usize, #[case] attempted: usize, #[case] halts: bool) {
        assert_eq!(FailurePolicy::default().should_halt(failed, attempted), halts);
    }

    #[rstest]
    #[case(2, 2, false)]
    #[case(2, 3, true)]
    #[case(1, 3, false)]
    #[case(2, 4, false)]
    fn test_strict_policy_waits_for_min_pages(#[case] failed: usize, #[case] attempted: usize, #[case] halts: bool) {
        let policy = FailurePolicy {
            max_failure_ratio: 0.5,
            min_pages: 3,
        };
        assert_eq!(policy.should_halt(failed, attempted), halts);
    }

    #[tokio::test]
    async fn test_visits_every_page_in_order() {
        let browser = StubBrowser::new()
            .with_page(BASE, wb_page(&["a", "b"]))
            .with_page(&format!("{BASE}?page=2"), wb_page(&["c"]))
            .with_page(&format!("{BASE}?page=3"), wb_page(&["d"]));

        let report = paginator()
            .paginate(&browser, BASE, 3, &CancellationToken::new())
            .await
            .unwrap();

        let titles: Vec<&str> = report.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
        assert_eq!(
            browser.visited(),
            vec![BASE.to_string(), format!("{BASE}?page=2"), format!("{BASE}?page=3")]
        );
        assert!(report.is_complete());
        assert_eq!(report.pages.len(), 3);
    }

    #[tokio::test]
    async fn test_append_policy_requests_page_one_explicitly() {
        let profile = SiteProfile::wildberries().with_first_page(crate::domain::FirstPagePolicy::AppendPageParam);
        let paginator = CatalogPaginator::new(profile, fast_config());
        let browser = StubBrowser::new().with_page(&format!("{BASE}?page=1"), wb_page(&["a"]));

        let report = paginator
            .paginate(&browser, BASE, 1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(browser.visited(), vec![format!("{BASE}?page=1")]);
        assert_eq!(report.products.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_page_is_recorded_and_crawl_continues() {
        let browser = StubBrowser::new()
            .with_page(BASE, wb_page(&["a"]))
            .with_page(&format!("{BASE}?page=3"), wb_page(&["c"]));

        let report = paginator()
            .paginate(&browser, BASE, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.products.len(), 2);
        assert_eq!(report.page_errors.len(), 1);
        assert_eq!(report.page_errors[0].page, 2);
        assert!(matches!(
            report.page_errors[0].failure,
            PageFailure::Browser(BrowserError::WaitTimedOut { .. })
        ));
        assert!(report.halt.is_none());
    }

    #[tokio::test]
    async fn test_navigation_failure_halts_and_keeps_products() {
        let browser = StubBrowser::new()
            .with_page(BASE, wb_page(&["a", "b"]))
            .with_page(&format!("{BASE}?page=3"), wb_page(&["c"]))
            .with_failing_navigation(&format!("{BASE}?page=2"));

        let report = paginator()
            .paginate(&browser, BASE, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.products.len(), 2);
        assert!(matches!(report.halt, Some(HaltReason::Navigation { page: 2, .. })));
        assert_eq!(browser.visited(), vec![BASE.to_string()]);
    }

    #[tokio::test]
    async fn test_lost_session_while_waiting_halts() {
        let browser = StubBrowser::new()
            .with_page(BASE, wb_page(&["a"]))
            .with_page(&format!("{BASE}?page=2"), wb_page(&["b"]))
            .with_lost_session(&format!("{BASE}?page=2"));

        let report = paginator()
            .paginate(&browser, BASE, 3, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.products.len(), 1);
        assert!(matches!(report.halt, Some(HaltReason::SessionLost { page: 2, .. })));
        assert!(report.page_errors.is_empty());
        assert_eq!(browser.visited().len(), 2);
    }

    #[tokio::test]
    async fn test_lost_session_mid_page_keeps_extracted_cards() {
        let cards = vec![
            wb_card("a", "100 ₽", "/catalog/1"),
            wb_card("b", "100 ₽", "/catalog/2").lost_session(".product-card__name"),
        ];
        let browser = StubBrowser::new()
            .with_page(BASE, StubPage::new(".product-card", cards))
            .with_page(&format!("{BASE}?page=2"), wb_page(&["c"]));

        let report = paginator()
            .paginate(&browser, BASE, 2, &CancellationToken::new())
            .await
            .unwrap();

        let titles: Vec<&str> = report.products.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["a"]);
        assert!(matches!(report.halt, Some(HaltReason::SessionLost { page: 1, .. })));
        assert_eq!(browser.visited(), vec![BASE.to_string()]);
    }

    #[tokio::test]
    async fn test_failure_rate_halts_pagination() {
        let mut config = fast_config();
        config.failure_policy = FailurePolicy {
            max_failure_ratio: 0.5,
            min_pages: 2,
        };
        let paginator = CatalogPaginator::new(SiteProfile::wildberries(), config);
        let browser = StubBrowser::new();

        let report = paginator
            .paginate(&browser, BASE, 10, &CancellationToken::new())
            .await
            .unwrap();

        assert!(report.products.is_empty());
        assert_eq!(
            report.halt,
            Some(HaltReason::FailureRateExceeded {
                failed: 2,
                attempted: 2
            })
        );
        assert_eq!(browser.visited().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_token_returns_cancelled() {
        let browser = StubBrowser::new().with_page(BASE, wb_page(&["a"]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = paginator().paginate(&browser, BASE, 3, &cancel).await;

        assert!(matches!(result, Err(CrawlError::Cancelled)));
        assert!(browser.visited().is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_during_page_delay() {
        let mut config = fast_config();
        config.page_delay = Duration::from_secs(30);
        let paginator = CatalogPaginator::new(SiteProfile::wildberries(), config);
        let browser = StubBrowser::new().with_page(BASE, wb_page(&["a"]));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = paginator.paginate(&browser, BASE, 3, &cancel).await;

        assert!(matches!(result, Err(CrawlError::Cancelled)));
        assert_eq!(browser.visited(), vec![BASE.to_string()]);
    }

    #[tokio::test]
    async fn test_pre_scroll_click_comes_from_profile() {
        let browser = StubBrowser::new().with_page(BASE, wb_page(&["a"]));

        paginator()
            .paginate(&browser, BASE, 1, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(browser.clicks(), vec!["#body-layout".to_string()]);
    }
}
