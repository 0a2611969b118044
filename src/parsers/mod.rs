//! Domain → Parser lookup with a generic fallback. Price extraction and
//! CAPTCHA detection are per-domain; the registry just dispatches.

mod amazon;
mod flipkart;
mod generic;

use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub use amazon::AmazonParser;
pub use flipkart::FlipkartParser;
pub use generic::GenericParser;

/// A fixed set of case-insensitive substrings indicating a human-verification
/// wall. Shared by every parser rather than duplicated per impl.
const CAPTCHA_MARKERS: &[&str] = &[
    "recaptcha",
    "g-recaptcha",
    "captcha",
    "cf-chl-manual-challenge",
    "verify you are human",
    "robot check",
    "security check",
];

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPrice {
    pub price: rust_decimal::Decimal,
    pub currency: String,
}

pub trait Parser: Send + Sync {
    fn parse_price(&self, html: &str) -> Option<ParsedPrice>;
}

/// Case-insensitive substring search over `CAPTCHA_MARKERS`. Shared by all
/// parsers, not overridable per domain.
pub fn detect_captcha(html: &str) -> bool {
    let low = html.to_lowercase();
    CAPTCHA_MARKERS.iter().any(|marker| low.contains(marker))
}

/// First 16 hex chars of SHA-256 over the HTML's UTF-8 bytes.
pub fn content_hash(html: &str) -> String {
    let digest = Sha256::digest(html.as_bytes());
    hex_prefix(&digest, 16)
}

fn hex_prefix(bytes: &[u8], len: usize) -> String {
    let mut s = String::with_capacity(len);
    for b in bytes {
        if s.len() >= len {
            break;
        }
        s.push_str(&format!("{b:02x}"));
    }
    s.truncate(len);
    s
}

/// Maps canonical domain strings to a `Parser`, with a distinguished `*`
/// fallback used when no exact match exists.
pub struct ParserRegistry {
    parsers: HashMap<String, Box<dyn Parser>>,
    fallback: Option<Box<dyn Parser>>,
}

impl ParserRegistry {
    pub fn new() -> Self {
        let mut parsers: HashMap<String, Box<dyn Parser>> = HashMap::new();
        parsers.insert("amazon.in".to_string(), Box::new(AmazonParser));
        parsers.insert("flipkart.com".to_string(), Box::new(FlipkartParser));

        Self {
            parsers,
            fallback: Some(Box::new(GenericParser)),
        }
    }

    /// Exact match, else the `*` fallback if one is configured.
    pub fn get(&self, domain: &str) -> Option<&dyn Parser> {
        self.parsers
            .get(domain)
            .map(|b| b.as_ref())
            .or(self.fallback.as_deref())
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared helper: read a JSON-LD `<script type="application/ld+json">` block
/// with a top-level `offers.price` field. Used by both the generic and
/// domain-specific parsers as a last-resort strategy.
pub(crate) fn parse_jsonld_offer_price(document: &scraper::Html) -> Option<ParsedPrice> {
    let selector = scraper::Selector::parse(r#"script[type="application/ld+json"]"#).ok()?;
    for el in document.select(&selector) {
        let text: String = el.text().collect();
        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            continue;
        };
        let offers = value.get("offers")?;
        let price = offers.get("price").and_then(|p| {
            p.as_str()
                .and_then(|s| s.parse::<rust_decimal::Decimal>().ok())
                .or_else(|| p.as_f64().and_then(rust_decimal::Decimal::from_f64_retain))
        });
        if let Some(price) = price {
            let currency = offers
                .get("priceCurrency")
                .and_then(|c| c.as_str())
                .unwrap_or("INR")
                .to_string();
            return Some(ParsedPrice { price, currency });
        }
    }
    None
}

/// Strips everything but digits/dot/comma, then drops comma thousands
/// separators and parses as a decimal. Returns `None` on an empty or
/// unparseable result.
pub(crate) fn extract_price_from_text(text: &str) -> Option<rust_decimal::Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let without_commas = cleaned.replace(',', "");
    without_commas.parse::<rust_decimal::Decimal>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captcha_detection_is_case_insensitive_and_substring_based() {
        assert!(detect_captcha("ROBOT CHECK"));
        assert!(detect_captcha("please complete this robot check to continue"));
        assert!(!detect_captcha("everything is fine"));
    }

    #[test]
    fn content_hash_is_deterministic_and_16_chars() {
        let a = content_hash("<html>hello</html>");
        let b = content_hash("<html>hello</html>");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn content_hash_differs_for_different_input() {
        assert_ne!(content_hash("a"), content_hash("b"));
    }

    #[test]
    fn registry_falls_back_to_generic_for_unknown_domain() {
        let registry = ParserRegistry::new();
        assert!(registry.get("example.com").is_some());
        assert!(registry.get("amazon.in").is_some());
    }

    #[test]
    fn extract_price_strips_currency_symbols_and_thousands_separators() {
        assert_eq!(
            extract_price_from_text("₹1,999"),
            Some(rust_decimal::Decimal::new(1999, 0))
        );
        assert_eq!(extract_price_from_text("no digits here"), None);
    }
}
