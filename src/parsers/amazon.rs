use rust_decimal::Decimal;
use scraper::{Html, Selector};

use super::{ParsedPrice, Parser, extract_price_from_text, parse_jsonld_offer_price};

/// Tries, in order: `.a-price-whole`, `#priceblock_ourprice`,
/// `#priceblock_dealprice`, any `[itemprop=price]` (content attr or text),
/// then JSON-LD `offers.price`. First non-null strategy wins.
pub struct AmazonParser;

impl Parser for AmazonParser {
    fn parse_price(&self, html: &str) -> Option<ParsedPrice> {
        let document = Html::parse_document(html);

        for selector_str in [
            ".a-price-whole",
            "#priceblock_ourprice",
            "#priceblock_dealprice",
        ] {
            if let Some(price) = select_text_price(&document, selector_str) {
                return Some(ParsedPrice {
                    price,
                    currency: "INR".to_string(),
                });
            }
        }

        if let Ok(selector) = Selector::parse("[itemprop=price]") {
            if let Some(el) = document.select(&selector).next() {
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

        parse_jsonld_offer_price(&document)
    }
}

fn select_text_price(document: &Html, selector_str: &str) -> Option<Decimal> {
    let selector = Selector::parse(selector_str).ok()?;
    let el = document.select(&selector).next()?;
    let text: String = el.text().collect();
    extract_price_from_text(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_price_whole() {
        let html = r#"<span class="a-price-whole">1,999</span>"#;
        let parsed = AmazonParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(1999, 0));
        assert_eq!(parsed.currency, "INR");
    }

    #[test]
    fn falls_back_to_priceblock_ourprice() {
        let html = r#"<span id="priceblock_ourprice">₹2,499.00</span>"#;
        let parsed = AmazonParser.parse_price(html).unwrap();
        assert_eq!(parsed.price, Decimal::new(249900, 2));
    }

    #[test]
    fn returns_none_when_no_strategy_matches() {
        let html = "<div>no price here</div>";
        assert!(AmazonParser.parse_price(html).is_none());
    }
}
