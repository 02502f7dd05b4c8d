//! Element lookup in fetched markup.

use crate::{parse_price, ExtractionError};
use pricewatch_core::ElementMatch;
use rust_decimal::Decimal;
use scraper::{Html, Selector};
use tracing::debug;

/// Full text of the first element in `body` matching `element`.
pub fn find_element_text(body: &str, element: &ElementMatch) -> Result<String, ExtractionError> {
    let css = element
        .to_css()
        .map_err(|e| ExtractionError::InvalidSelector {
            selector: format!("{:?}", element),
            reason: e.to_string(),
        })?;

    let selector = Selector::parse(&css).map_err(|e| ExtractionError::InvalidSelector {
        selector: css.clone(),
        reason: e.to_string(),
    })?;

    let document = Html::parse_document(body);
    let matched = document
        .select(&selector)
        .next()
        .ok_or_else(|| ExtractionError::NoMatch(css.clone()))?;

    let text: String = matched.text().collect();
    debug!(selector = %css, text = text.trim(), "Matched price element");
    Ok(text)
}

/// Locate the price element in `body` and parse its digits.
pub fn extract_from_html(body: &str, element: &ElementMatch) -> Result<Decimal, ExtractionError> {
    let text = find_element_text(body, element)?;
    parse_price(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"
        <html>
          <body>
            <div class="product" data-sku="A-77">
              <h1>Widget</h1>
              <span class="label price-old">was 2 100</span>
              <span class="price current" id="main-price">19.99 <small>USD</small></span>
              <span class="price">5.00</span>
            </div>
          </body>
        </html>
    "#;

    #[test]
    fn test_first_class_match_wins() {
        let element = ElementMatch::new().with("class_", "price");
        assert_eq!(extract_from_html(PAGE, &element).unwrap(), Decimal::from(1999));
    }

    #[test]
    fn test_tag_and_id() {
        let element = ElementMatch::new().with("name", "span").with("id", "main-price");
        let text = find_element_text(PAGE, &element).unwrap();
        assert_eq!(text, "19.99 USD");
    }

    #[test]
    fn test_nested_text_includes_every_digit_run() {
        let element = ElementMatch::new().with("name", "div").with("data-sku", "A-77");
        // the old price and the current one are both inside the div
        assert_eq!(
            extract_from_html(PAGE, &element).unwrap(),
            Decimal::from(21_001_999_500i64)
        );
    }

    #[test]
    fn test_no_match() {
        let element = ElementMatch::new().with("class_", "missing");
        let err = extract_from_html(PAGE, &element).unwrap_err();
        assert!(matches!(err, ExtractionError::NoMatch(css) if css == r#"[class~="missing"]"#));
    }

    #[test]
    fn test_no_digits_in_match() {
        let element = ElementMatch::new().with("name", "h1");
        let err = extract_from_html(PAGE, &element).unwrap_err();
        assert!(matches!(err, ExtractionError::NoDigits(_)));
    }

    #[test]
    fn test_invalid_rule() {
        let element = ElementMatch::new().with("name", "span b");
        let err = extract_from_html(PAGE, &element).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidSelector { .. }));
    }
}
