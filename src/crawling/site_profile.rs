//! Site profiles: everything that differs between marketplaces
//!
//! One crawl pipeline serves every site; a `SiteProfile` injects the
//! selectors, the first-page URL policy, the product link base and the text
//! normalizer.

use std::sync::Arc;

use super::normalizer::{
    AliExpressNormalizer, CardNormalizer, OzonNormalizer, WildberriesNormalizer,
};
use crate::domain::{FirstPagePolicy, Site};

/// CSS selectors for one product card; all but `card` are scoped to the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelectors {
    pub card: String,
    pub title: String,
    pub price: String,
    /// Node whose `href` points at the product page
    pub link: String,
    pub rate: String,
    /// `None` when the review count is part of the rating element's text
    pub reviews: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SiteProfile {
    pub site: Site,
    pub first_page: FirstPagePolicy,
    /// Base URL for relative product links
    pub link_base: Option<String>,
    pub selectors: CardSelectors,
    /// Clicked before every scroll round to focus the listing
    pub pre_scroll_click: Option<String>,
    pub normalizer: Arc<dyn CardNormalizer>,
}

impl SiteProfile {
    pub fn for_site(site: Site) -> Self {
        match site {
            Site::Wildberries => Self::wildberries(),
            Site::Ozon => Self::ozon(),
            Site::AliExpress => Self::aliexpress(),
        }
    }

    pub fn wildberries() -> Self {
        Self {
            site: Site::Wildberries,
            first_page: FirstPagePolicy::BareUrl,
            link_base: None,
            selectors: CardSelectors {
                card: ".product-card".to_string(),
                title: ".product-card__name".to_string(),
                price: ".price__wrap".to_string(),
                link: ".product-card__link".to_string(),
                rate: ".address-rate-mini".to_string(),
                reviews: Some(".product-card__count".to_string()),
            },
            pre_scroll_click: Some("#body-layout".to_string()),
            normalizer: Arc::new(WildberriesNormalizer),
        }
    }

    pub fn ozon() -> Self {
        Self {
            site: Site::Ozon,
            first_page: FirstPagePolicy::AppendPageParam,
            link_base: Some("https://www.ozon.ru".to_string()),
            selectors: CardSelectors {
                card: ".tile-root".to_string(),
                title: ".tsBody500Medium".to_string(),
                price: ".c3011-a0".to_string(),
                link: ".tile-hover-target".to_string(),
                rate: ".tsBodyMBold".to_string(),
                reviews: None,
            },
            pre_scroll_click: None,
            normalizer: Arc::new(OzonNormalizer),
        }
    }

    pub fn aliexpress() -> Self {
        Self {
            site: Site::AliExpress,
            first_page: FirstPagePolicy::AppendPageParam,
            link_base: None,
            selectors: CardSelectors {
                card: ".product-snippet_ProductSnippet__content__1mogfw".to_string(),
                title: ".product-snippet_ProductSnippet__name__1mogfw".to_string(),
                price: ".snow-price_SnowPrice__mainM__uw8t09".to_string(),
                link: ".product-snippet_ProductSnippet__galleryBlock__1mogfw".to_string(),
                rate: ".product-snippet_ProductSnippet__score__1mogfw".to_string(),
                reviews: Some(".product-snippet_ProductSnippet__sold__1mogfw".to_string()),
            },
            pre_scroll_click: None,
            normalizer: Arc::new(AliExpressNormalizer),
        }
    }

    /// Swap the text normalizer, keeping selectors and URL policy
    pub fn with_normalizer(mut self, normalizer: Arc<dyn CardNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Replace the first-page policy
    pub fn with_first_page(mut self, policy: FirstPagePolicy) -> Self {
        self.first_page = policy;
        self
    }
}
