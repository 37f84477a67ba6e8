//! Supported marketplaces
//!
//! Each site owns its default category URL (the one its CLI falls back to)
//! and the short key used in output file names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default category URLs of the per-site binaries
pub mod default_urls {
    pub const WILDBERRIES: &str =
        "https://www.wildberries.ru/catalog/dom/hranenie-veshchey/korobki-korzinki-keysy";
    pub const OZON: &str =
        "https://www.ozon.ru/category/shvabry-14618/?text=%D1%88%D0%B2%D0%B0%D0%B1%D1%80%D0%B0";
    pub const ALIEXPRESS: &str = "https://aliexpress.ru/category/22/electronic-components-supplies?spm=a2g2w.home.0.0.75df5586E01UcQ&source=nav_category";
}

/// Marketplace whose catalog is being crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Wildberries,
    Ozon,
    AliExpress,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Wildberries, Site::Ozon, Site::AliExpress];

    /// Short key used as the output file prefix and binary name
    pub fn key(self) -> &'static str {
        match self {
            Site::Wildberries => "wb",
            Site::Ozon => "ozon",
            Site::AliExpress => "ali",
        }
    }

    pub fn default_url(self) -> &'static str {
        match self {
            Site::Wildberries => default_urls::WILDBERRIES,
            Site::Ozon => default_urls::OZON,
            Site::AliExpress => default_urls::ALIEXPRESS,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|site| site.key() == key)
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Site::Wildberries => "Wildberries",
            Site::Ozon => "Ozon",
            Site::AliExpress => "AliExpress",
        };
        f.write_str(name)
    }
}
