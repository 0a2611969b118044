use scraper::{Html, Selector};

use super::{ParsedPrice, Parser, extract_price_from_text, parse_jsonld_offer_price};

const SELECTORS: &[&str] = &[
    "[itemprop=price]",
    ".price",
    ".Price",
    ".sale-price",
    ".a-price-whole",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
];

/// The registry's `*` fallback: JSON-LD offers first, then a fixed list of
/// common price selectors, first candidate that parses wins.
pub struct GenericParser;

impl Parser for GenericParser {
    fn parse_price(&self, html: &str) -> Option<ParsedPrice> {
        let document = Html::parse_document(html);

        if let Some(parsed) = parse_jsonld_offer_price(&document) {
            return Some(parsed);
        }

        for selector_str in SELECTORS {
            let Ok(selector) = Selector::parse(selector_str) else {
                continue;
            };
            for el in document.select(&selector) {
                let text = el
                    .value()
                    .attr("content")
                    .map(str::to_string)
                    .unwrap_or_else(|| el.text().collect());
                if let Some(price) = extract_price_from_text(&text) {
                    return Some(ParsedPrice {
                        price,
                        currency: "INR".to_string(),
                    });
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn parses_generic_price_class() {
        let html = r#"<div class="price">₹3,499</div>"#;
        let parsed = GenericParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(3499, 0));
    }

    #[test]
    fn prefers_jsonld_over_selectors() {
        let html = r#"
            <script type="application/ld+json">{"offers": {"price": "1234", "priceCurrency": "INR"}}</script>
            <div class="price">9999</div>
        "#;
        let parsed = GenericParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(1234, 0));
    }

    #[test]
    fn returns_none_when_nothing_matches() {
        assert!(GenericParser.parse_price("<div>nothing</div>").is_none());
    }
}
