//! Price extraction from web pages.
//!
//! Fetches a target page, locates the element described by its match rule
//! and turns the element text into a decimal price.

pub mod client;
pub mod digits;
pub mod error;
pub mod html;

pub use client::{ExtractorConfig, HttpExtractor, PriceSource, DEFAULT_USER_AGENT};
pub use digits::{concat_digits, parse_price};
pub use error::ExtractionError;
pub use html::{extract_from_html, find_element_text};
