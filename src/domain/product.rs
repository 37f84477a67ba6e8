use serde::{Deserialize, Serialize};

/// One product card scraped from a catalog listing page.
///
/// All fields are best-effort strings; empty values and locale leftovers are
/// legal. A card is built once during page extraction and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCard {
    pub url: String,
    pub title: String,
    pub price: String,
    pub full_price: String,
    pub rate: String,
    pub reviews: String,
}

impl ProductCard {
    /// Column order of the CSV output
    pub const CSV_HEADER: [&'static str; 6] =
        ["title", "url", "price", "full_price", "rate", "reviews"];

    /// Values in `CSV_HEADER` order
    pub fn csv_record(&self) -> [&str; 6] {
        [
            &self.title,
            &self.url,
            &self.price,
            &self.full_price,
            &self.rate,
            &self.reviews,
        ]
    }
}
