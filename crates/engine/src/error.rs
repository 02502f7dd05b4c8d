//! Error types for a price check run.

use pricewatch_alerts::NotifyError;
use pricewatch_extractor::ExtractionError;
use pricewatch_store::StoreError;
use thiserror::Error;

/// Errors that can stop a target, or the whole run.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Target registry unavailable: {0}")]
    Registry(#[source] StoreError),

    #[error("Price extraction failed for {title}: {source}")]
    Extraction {
        title: String,
        #[source]
        source: ExtractionError,
    },

    #[error("Price store failed for {title}: {source}")]
    Store {
        title: String,
        #[source]
        source: StoreError,
    },

    #[error("Notification failed for {title}: {source}")]
    Notify {
        title: String,
        #[source]
        source: NotifyError,
    },
}

impl MonitorError {
    /// Title of the target that failed, if the error belongs to one.
    pub fn title(&self) -> Option<&str> {
        match self {
            MonitorError::Registry(_) => None,
            MonitorError::Extraction { title, .. }
            | MonitorError::Store { title, .. }
            | MonitorError::Notify { title, .. } => Some(title),
        }
    }
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
