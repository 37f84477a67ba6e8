//! Product card field extraction
//!
//! Title, price block and product link are mandatory and read together under
//! one short budget; a card missing any of them is skipped. Rating and
//! review text are optional, each read under a smaller budget, and fall back
//! to empty strings.

use std::fmt;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use super::site_profile::SiteProfile;
use crate::domain::ProductCard;
use crate::infrastructure::browser::BrowserSession;
use crate::infrastructure::config::CrawlerConfig;
use crate::infrastructure::error::BrowserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    pub mandatory_timeout: Duration,
    pub optional_timeout: Duration,
}

impl From<&CrawlerConfig> for ExtractorConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            mandatory_timeout: config.mandatory_timeout(),
            optional_timeout: config.optional_timeout(),
        }
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

/// Why a card produced no `ProductCard`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardSkip {
    /// The mandatory batch did not finish within its budget
    MandatoryTimeout { timeout_ms: u64 },
    /// A mandatory read failed outright
    FieldUnavailable { field: &'static str, error: BrowserError },
    /// No link node, or a link node without `href`
    MissingLink,
}

impl CardSkip {
    /// Browser error that ends the session, if this skip carries one
    pub fn fatal_error(&self) -> Option<&BrowserError> {
        match self {
            Self::FieldUnavailable { error, .. } if error.is_fatal() => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for CardSkip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MandatoryTimeout { timeout_ms } => {
                write!(f, "mandatory fields not ready within {timeout_ms}ms")
            }
            Self::FieldUnavailable { field, error } => write!(f, "{field} unavailable: {error}"),
            Self::MissingLink => f.write_str("product link missing"),
        }
    }
}

/// Cards extracted from one page plus the ones that were skipped
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub cards: Vec<ProductCard>,
    /// (card index on the page, reason)
    pub skipped: Vec<(usize, CardSkip)>,
    /// Session-ending error that stopped extraction early
    pub fatal: Option<BrowserError>,
}

/// Raw mandatory text read from a card
struct MandatoryFields {
    title: String,
    price_block: String,
    href: String,
}

pub struct FieldExtractor<'a> {
    profile: &'a SiteProfile,
    config: ExtractorConfig,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(profile: &'a SiteProfile, config: ExtractorConfig) -> Self {
        Self { profile, config }
    }

    /// Extract every card in order; skipped cards are logged and recorded.
    /// Stops at the first card whose read lost the browser session.
    pub async fn extract_all<B>(&self, browser: &B, cards: &[B::Element]) -> PageExtraction
    where
        B: BrowserSession + ?Sized,
    {
        let mut extraction = PageExtraction::default();

        for (index, card) in cards.iter().enumerate() {
            match self.extract(browser, card).await {
                Ok(product) => extraction.cards.push(product),
                Err(skip) => {
                    if let Some(error) = skip.fatal_error() {
                        extraction.fatal = Some(error.clone());
                        extraction.skipped.push((index, skip));
                        break;
                    }
                    debug!("Skipping card {}: {}", index, skip);
                    extraction.skipped.push((index, skip));
                }
            }
        }

        extraction
    }

    pub async fn extract<B>(&self, browser: &B, card: &B::Element) -> Result<ProductCard, CardSkip>
    where
        B: BrowserSession + ?Sized,
    {
        let mandatory = timeout(self.config.mandatory_timeout, self.read_mandatory(browser, card))
            .await
            .map_err(|_| CardSkip::MandatoryTimeout {
                timeout_ms: u64::try_from(self.config.mandatory_timeout.as_millis())
                    .unwrap_or(u64::MAX),
            })??;

        let selectors = &self.profile.selectors;
        let rate_raw = self.read_optional(browser, card, &selectors.rate).await;
        let reviews_raw = match &selectors.reviews {
            Some(selector) => self.read_optional(browser, card, selector).await,
            None => rate_raw.clone(),
        };

        let normalizer = &self.profile.normalizer;
        Ok(ProductCard {
            url: self.resolve_link(&mandatory.href),
            title: normalizer.title(&mandatory.title),
            price: normalizer.price(&mandatory.price_block),
            full_price: normalizer.full_price(&mandatory.price_block),
            rate: normalizer.rate(&rate_raw),
            reviews: normalizer.reviews(&reviews_raw),
        })
    }

    async fn read_mandatory<B>(&self, browser: &B, card: &B::Element) -> Result<MandatoryFields, CardSkip>
    where
        B: BrowserSession + ?Sized,
    {
        let selectors = &self.profile.selectors;

        let title = browser
            .text_within(card, &selectors.title)
            .await
            .map_err(|error| CardSkip::FieldUnavailable { field: "title", error })?;
        let price_block = browser
            .text_within(card, &selectors.price)
            .await
            .map_err(|error| CardSkip::FieldUnavailable { field: "price", error })?;
        let links = browser
            .query_within(card, &selectors.link)
            .await
            .map_err(|error| CardSkip::FieldUnavailable { field: "link", error })?;

        let link = links.first().ok_or(CardSkip::MissingLink)?;
        let href = browser
            .attribute(link, "href")
            .await
            .map_err(|error| CardSkip::FieldUnavailable { field: "link", error })?
            .filter(|href| !href.trim().is_empty())
            .ok_or(CardSkip::MissingLink)?;

        Ok(MandatoryFields {
            title,
            price_block,
            href,
        })
    }

    async fn read_optional<B>(&self, browser: &B, card: &B::Element, selector: &str) -> String
    where
        B: BrowserSession + ?Sized,
    {
        match timeout(self.config.optional_timeout, browser.text_within(card, selector)).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                debug!("Optional field '{}' unavailable: {}", selector, e);
                String::new()
            }
            Err(_) => String::new(),
        }
    }

    /// Absolute product URL; relative links are joined onto the site base
    pub fn resolve_link(&self, href: &str) -> String {
        let href = href.trim();
        let Some(base) = &self.profile.link_base else {
            return href.to_string();
        };

        match Url::parse(base).and_then(|base| base.join(href)) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Could not join '{}' onto '{}': {}", href, base, e);
                format!("{base}{href}")
            }
        }
    }
}
