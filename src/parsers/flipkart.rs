use scraper::{Html, Selector};

use super::{ParsedPrice, Parser, parse_jsonld_offer_price};

/// Tries `div._30jeq3._16Jk6d`, then `._30jeq3`, then JSON-LD offers.
pub struct FlipkartParser;

impl Parser for FlipkartParser {
    fn parse_price(&self, html: &str) -> Option<ParsedPrice> {
        let document = Html::parse_document(html);

        for selector_str in ["div._30jeq3._16Jk6d", "._30jeq3"] {
            if let Some(parsed) = select_price(&document, selector_str) {
                return Some(parsed);
            }
        }

        parse_jsonld_offer_price(&document)
    }
}

fn select_price(document: &Html, selector_str: &str) -> Option<ParsedPrice> {
    let selector = Selector::parse(selector_str).ok()?;
    let el = document.select(&selector).next()?;
    let text: String = el.text().collect();
    let cleaned = text.replace(',', "").replace('₹', "");
    cleaned.trim().parse().ok().map(|price| ParsedPrice {
        price,
        currency: "INR".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn parses_primary_selector() {
        let html = r#"<div class="_30jeq3 _16Jk6d">₹2,499</div>"#;
        let parsed = FlipkartParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(2499, 0));
    }

    #[test]
    fn parses_alternate_selector() {
        let html = r#"<div class="_30jeq3">₹999</div>"#;
        let parsed = FlipkartParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(999, 0));
    }

    #[test]
    fn returns_none_without_a_match() {
        assert!(FlipkartParser.parse_price("<div>nope</div>").is_none());
    }
}
