//! Full runs against the scripted browser: pagination, extraction and CSV

use catalog_crawler_lib::crawling::HaltReason;
use catalog_crawler_lib::infrastructure::{AppConfig, CrawlError, CrawlerConfig};
use catalog_crawler_lib::test_utils::{StubBrowser, StubPage, wb_card};
use catalog_crawler_lib::{CatalogCrawlService, Site};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const BASE: &str = "https://www.wildberries.ru/catalog/dom/korobki";

fn config(dir: &TempDir, max_pages: u32) -> AppConfig {
    AppConfig {
        crawler: CrawlerConfig {
            max_pages,
            output_dir: dir.path().to_string_lossy().into_owned(),
            page_ready_timeout_ms: 20,
            scroll_settle_delay_ms: 0,
            optional_timeout_ms: 20,
            ..CrawlerConfig::default()
        },
        ..AppConfig::default()
    }
}

fn three_card_page() -> StubPage {
    StubPage::new(
        ".product-card",
        vec![
            wb_card("Коробка, малая", "199 ₽", "https://www.wildberries.ru/catalog/1/detail.aspx")
                .text(".address-rate-mini", "4.9")
                .text(".product-card__count", "1 024 оценки"),
            wb_card("Корзина \"Лофт\"", "1 299 ₽ 1 999 ₽", "https://www.wildberries.ru/catalog/2/detail.aspx")
                .text(".product-card__count", "Нет оценок"),
            wb_card("Кейс / органайзер", "450 ₽", "https://www.wildberries.ru/catalog/3/detail.aspx"),
        ],
    )
    .with_visible_counts(vec![2, 3, 3])
}

fn read_csv(path: &std::path::Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect()
}

#[tokio::test]
async fn empty_second_page_keeps_first_page_rows() {
    let dir = TempDir::new().unwrap();
    let service = CatalogCrawlService::new(Site::Wildberries, config(&dir, 2));
    let browser = StubBrowser::new()
        .with_page(BASE, three_card_page())
        .with_page(&format!("{BASE}?page=2"), StubPage::new(".product-card", Vec::new()));

    let summary = service
        .run_with_browser(&browser, BASE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.products, 3);
    assert_eq!(summary.pages_crawled, 1);
    assert_eq!(summary.pages_failed, 1);
    assert!(summary.halt.is_none());

    let rows = read_csv(&summary.output);
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0], vec!["title", "url", "price", "full_price", "rate", "reviews"]);
    assert_eq!(
        rows[1],
        vec![
            "Коробка, малая",
            "https://www.wildberries.ru/catalog/1/detail.aspx",
            "199",
            "199",
            "4.9",
            "1024",
        ]
    );
    assert_eq!(rows[2][0], "Корзина \"Лофт\"");
    assert_eq!(rows[2][2], "1299");
    assert_eq!(rows[2][3], "1999");
    assert_eq!(rows[2][5], "");
    assert_eq!(rows[3][0], "Кейс  органайзер");

    let file_name = summary.output.file_name().unwrap().to_string_lossy().into_owned();
    assert!(file_name.starts_with("wb-products-"));
    assert!(file_name.ends_with(".csv"));
}

#[tokio::test]
async fn navigation_failure_still_writes_collected_rows() {
    let dir = TempDir::new().unwrap();
    let service = CatalogCrawlService::new(Site::Wildberries, config(&dir, 5));
    let browser = StubBrowser::new()
        .with_page(BASE, three_card_page())
        .with_failing_navigation(&format!("{BASE}?page=2"));

    let summary = service
        .run_with_browser(&browser, BASE, &CancellationToken::new())
        .await
        .unwrap();

    assert!(matches!(summary.halt, Some(HaltReason::Navigation { page: 2, .. })));
    assert_eq!(read_csv(&summary.output).len(), 4);
    assert_eq!(browser.visited(), vec![BASE.to_string()]);
}

#[tokio::test]
async fn requesting_more_pages_than_exist_is_not_an_error() {
    let dir = TempDir::new().unwrap();
    let service = CatalogCrawlService::new(Site::Wildberries, config(&dir, 4));
    let browser = StubBrowser::new().with_page(BASE, three_card_page());

    let summary = service
        .run_with_browser(&browser, BASE, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.products, 3);
    assert_eq!(summary.pages_failed, 3);
    assert_eq!(browser.visited().len(), 4);
}

#[tokio::test]
async fn cancellation_leaves_no_csv() {
    let dir = TempDir::new().unwrap();
    let service = CatalogCrawlService::new(Site::Wildberries, config(&dir, 2));
    let browser = StubBrowser::new().with_page(BASE, three_card_page());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = service.run_with_browser(&browser, BASE, &cancel).await;

    assert!(matches!(result, Err(CrawlError::Cancelled)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
