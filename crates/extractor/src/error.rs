//! Error types for price extraction.

use thiserror::Error;

/// Errors that can occur while fetching a page or reading its price.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No element matches {0}")]
    NoMatch(String),

    #[error("No digits in element text: {0:?}")]
    NoDigits(String),

    #[error("Price does not fit a decimal: {0}")]
    Overflow(String),
}

impl ExtractionError {
    /// Returns true if the page was fetched but did not contain a usable price.
    pub fn is_markup_error(&self) -> bool {
        matches!(
            self,
            ExtractionError::NoMatch(_)
                | ExtractionError::NoDigits(_)
                | ExtractionError::Overflow(_)
        )
    }
}
