//! Digit-only price parsing.
//!
//! Every ASCII digit run in the text is concatenated in order and read as an
//! integer. Decimal points, thousands separators and currency symbols are
//! dropped, so `"19.99"` reads as `1999`. Any other number inside the element
//! (a product id, a crossed-out old price) ends up in the result too.

use crate::ExtractionError;
use rust_decimal::Decimal;
use std::str::FromStr;

pub fn concat_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

pub fn parse_price(text: &str) -> Result<Decimal, ExtractionError> {
    let digits = concat_digits(text);
    if digits.is_empty() {
        return Err(ExtractionError::NoDigits(text.trim().to_string()));
    }
    Decimal::from_str(&digits).map_err(|_| ExtractionError::Overflow(digits))
}
