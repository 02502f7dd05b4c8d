//! Scheduler entry point.

use crate::config::{AppConfig, ConfigError};
use pricewatch_alerts::{TelegramClient, TelegramNotifier};
use pricewatch_core::ElementMatchError;
use pricewatch_engine::{Monitor, MonitorError, RunReport};
use pricewatch_extractor::{ExtractionError, HttpExtractor};
use pricewatch_store::{SqliteStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("HTTP client setup failed: {0}")]
    Extractor(#[from] ExtractionError),
    #[error("Run aborted: {0}")]
    Monitor(#[from] MonitorError),
    #[error("Invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Invalid element rule: {0}")]
    InvalidElement(#[from] ElementMatchError),
}

/// Result of one scheduled invocation.
#[derive(Debug, Serialize)]
pub struct RunStatus {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub report: RunReport,
}

/// Run one price check over every registered target.
///
/// Takes no payload from the trigger; everything comes from `config`.
pub async fn invoke(config: &AppConfig) -> Result<RunStatus, HandlerError> {
    let telegram = config.require_telegram()?.clone();

    let store = Arc::new(SqliteStore::connect(&config.database_url).await?);
    let extractor = Arc::new(HttpExtractor::new(&config.extractor)?);
    let notifier = Arc::new(TelegramNotifier::new(TelegramClient::new(telegram)));

    let monitor = Monitor::new(
        store.clone(),
        store,
        extractor,
        notifier,
        config.monitor.clone(),
    );

    let report = monitor.run().await?;
    info!(notified = report.notified(), total = report.total(), "Invocation complete");

    Ok(RunStatus {
        status_code: 200,
        report,
    })
}
