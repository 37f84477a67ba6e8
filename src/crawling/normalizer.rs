//! Text normalization for scraped card fields
//!
//! Listing pages render prices and counters as localized display text:
//! `"1 234 ₽"`, thin and no-break spaces between digit groups, unit words
//! such as "отзывов" or "покупок" after counts. Each site gets a
//! `CardNormalizer` that turns that text into plain values.
//!
//! Every function here is total: any input, including empty or malformed
//! text, produces a string. Price, rating and review outputs never contain
//! the currency sign or Unicode space characters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Debug;

/// Russian ruble sign used by all supported sites
pub const CURRENCY_SYMBOL: char = '₽';

/// Review counter text meaning "no reviews yet"
pub const NO_REVIEWS_MARKER: &str = "Нет";

static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

/// Per-site cleanup of raw card text.
///
/// `full_price` receives the same raw price block as `price`; it picks the
/// pre-discount value when the block shows two prices.
pub trait CardNormalizer: Send + Sync + Debug {
    fn title(&self, raw: &str) -> String;
    fn price(&self, raw: &str) -> String;
    fn full_price(&self, raw: &str) -> String;
    fn rate(&self, raw: &str) -> String;
    fn reviews(&self, raw: &str) -> String;
}

/// Text up to the first newline
pub fn first_line(raw: &str) -> &str {
    raw.split('\n').next().unwrap_or_default()
}

/// Drop whitespace of every kind (ASCII, no-break, thin, narrow no-break),
/// the currency sign and U+FFFD replacement characters.
pub fn strip_price_noise(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && *c != CURRENCY_SYMBOL && *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Clean amount from the text before the first currency sign
pub fn clean_amount(segment: &str) -> String {
    strip_price_noise(segment.split(CURRENCY_SYMBOL).next().unwrap_or_default())
}

/// First whitespace-delimited token, e.g. the score in `"4.8 · 120 отзывов"`
pub fn leading_token(raw: &str) -> String {
    strip_price_noise(raw.split_whitespace().next().unwrap_or_default())
}

/// Every ASCII digit run in `raw`, concatenated
pub fn digits_only(raw: &str) -> String {
    DIGITS.find_iter(raw).map(|m| m.as_str()).collect()
}

/// Tokens separated by plain spaces, the last one removed
fn drop_last_word(raw: &str) -> String {
    let mut tokens: Vec<&str> = raw.split(' ').collect();
    tokens.pop();
    tokens.concat()
}

/// Tokens separated by plain spaces, the first one removed
fn drop_first_word(raw: &str) -> String {
    raw.split(' ').skip(1).collect()
}

/// Trimmed title with Unicode spaces folded to plain spaces
fn clean_title(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Wildberries: price block like `"1 234 ₽ 2 000 ₽"` on its first line,
/// counters like `"1 234 оценки"` or `"Нет оценок"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WildberriesNormalizer;

impl CardNormalizer for WildberriesNormalizer {
    fn title(&self, raw: &str) -> String {
        clean_title(&raw.replace('/', ""))
    }

    fn price(&self, raw: &str) -> String {
        clean_amount(first_line(raw))
    }

    fn full_price(&self, raw: &str) -> String {
        let segments: Vec<&str> = first_line(raw).split(CURRENCY_SYMBOL).collect();
        // Two prices leave three segments: current, old, trailing text
        if segments.len() < 3 {
            return self.price(raw);
        }
        strip_price_noise(segments[1])
    }

    fn rate(&self, raw: &str) -> String {
        leading_token(raw)
    }

    fn reviews(&self, raw: &str) -> String {
        let count = strip_price_noise(&drop_last_word(raw));
        if count == NO_REVIEWS_MARKER {
            return String::new();
        }
        count
    }
}

/// Ozon: price block with the current price on the first line and the
/// pre-discount price on the second; rating and review count share one
/// element, e.g. `"4.8 · 120 отзывов"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OzonNormalizer;

impl CardNormalizer for OzonNormalizer {
    fn title(&self, raw: &str) -> String {
        clean_title(raw)
    }

    fn price(&self, raw: &str) -> String {
        clean_amount(first_line(raw))
    }

    fn full_price(&self, raw: &str) -> String {
        match raw.split('\n').nth(1) {
            Some(second_line) => clean_amount(second_line),
            None => self.price(raw),
        }
    }

    fn rate(&self, raw: &str) -> String {
        leading_token(raw)
    }

    fn reviews(&self, raw: &str) -> String {
        digits_only(&drop_first_word(raw))
    }
}

/// AliExpress: a single sale price, sold counter like `"1 234 купили"`.
#[derive(Debug, Default, Clone, Copy)]
pub struct AliExpressNormalizer;

impl CardNormalizer for AliExpressNormalizer {
    fn title(&self, raw: &str) -> String {
        clean_title(raw)
    }

    fn price(&self, raw: &str) -> String {
        clean_amount(first_line(raw))
    }

    fn full_price(&self, raw: &str) -> String {
        self.price(raw)
    }

    fn rate(&self, raw: &str) -> String {
        leading_token(raw)
    }

    fn reviews(&self, raw: &str) -> String {
        digits_only(&drop_last_word(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn normalizers() -> [&'static dyn CardNormalizer; 3] {
        [&WildberriesNormalizer, &OzonNormalizer, &AliExpressNormalizer]
    }

    #[rstest]
    #[case("1 234 ₽\n567 ₽", "1234", "567")]
    #[case("999 ₽", "999", "999")]
    #[case("1\u{2009}299\u{00A0}₽\n2\u{2009}000\u{00A0}₽", "1299", "2000")]
    #[case("", "", "")]
    fn test_ozon_prices(#[case] raw: &str, #[case] price: &str, #[case] full_price: &str) {
        assert_eq!(OzonNormalizer.price(raw), price);
        assert_eq!(OzonNormalizer.full_price(raw), full_price);
    }

    #[rstest]
    #[case("1 234 ₽2 000 ₽\nскидка", "1234", "2000")]
    #[case("999 ₽", "999", "999")]
    #[case("1\u{00A0}234\u{00A0}₽", "1234", "1234")]
    #[case("Нет в наличии", "Нетвналичии", "Нетвналичии")]
    fn test_wildberries_prices(#[case] raw: &str, #[case] price: &str, #[case] full_price: &str) {
        assert_eq!(WildberriesNormalizer.price(raw), price);
        assert_eq!(WildberriesNormalizer.full_price(raw), full_price);
    }

    #[rstest]
    #[case("1 234 оценки", "1234")]
    #[case("12\u{00A0}345 оценок", "12345")]
    #[case("Нет оценок", "")]
    #[case("", "")]
    fn test_wildberries_reviews(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(WildberriesNormalizer.reviews(raw), expected);
    }

    #[test]
    fn test_wildberries_title_strips_slashes() {
        assert_eq!(WildberriesNormalizer.title(" Ящик / пластиковый "), "Ящик  пластиковый");
        assert_eq!(WildberriesNormalizer.title("/ Корзина"), "Корзина");
    }

    #[rstest]
    #[case("4.8 · 120 отзывов", "4.8", "120")]
    #[case("4.9 · 1\u{00A0}234 отзыва", "4.9", "1234")]
    #[case("5.0", "5.0", "")]
    fn test_ozon_rate_and_reviews_share_one_element(
        #[case] raw: &str,
        #[case] rate: &str,
        #[case] reviews: &str,
    ) {
        assert_eq!(OzonNormalizer.rate(raw), rate);
        assert_eq!(OzonNormalizer.reviews(raw), reviews);
    }

    #[test]
    fn test_aliexpress_single_price_and_sold_counter() {
        assert_eq!(AliExpressNormalizer.price("1 099,50 ₽"), "1099,50");
        assert_eq!(AliExpressNormalizer.full_price("1 099,50 ₽"), "1099,50");
        assert_eq!(AliExpressNormalizer.reviews("1 234 купили"), "1234");
        assert_eq!(AliExpressNormalizer.rate(" 4.7 "), "4.7");
    }

    #[test]
    fn test_replacement_characters_are_dropped() {
        assert_eq!(strip_price_noise("1\u{FFFD}234"), "1234");
    }

    proptest! {
        #[test]
        fn prop_numeric_fields_never_keep_currency_or_unicode_spaces(raw in any::<String>()) {
            for normalizer in normalizers() {
                for value in [
                    normalizer.price(&raw),
                    normalizer.full_price(&raw),
                    normalizer.rate(&raw),
                    normalizer.reviews(&raw),
                ] {
                    prop_assert!(!value.contains(CURRENCY_SYMBOL), "currency sign in {:?}", value);
                    prop_assert!(
                        !value.chars().any(char::is_whitespace),
                        "unicode space in {:?}",
                        value
                    );
                }
                let title = normalizer.title(&raw);
                prop_assert!(!title.contains('\u{00A0}'), "no-break space in title {:?}", title);
            }
        }

        #[test]
        fn prop_single_price_full_price_equals_price(amount in 0u32..10_000_000) {
            let raw = format!("{amount} ₽");
            for normalizer in normalizers() {
                prop_assert_eq!(normalizer.full_price(&raw), normalizer.price(&raw));
                prop_assert_eq!(normalizer.price(&raw), amount.to_string());
            }
        }
    }
}
