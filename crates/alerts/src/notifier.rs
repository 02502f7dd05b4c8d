//! Price change notifications.

use crate::telegram::{TelegramClient, TelegramError};
use async_trait::async_trait;
use pricewatch_core::{PriceRecord, Trend};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Telegram error: {0}")]
    Telegram(#[from] TelegramError),
}

/// Destination for price change messages.
#[async_trait]
pub trait PriceNotifier: Send + Sync {
    /// Announce `record`, with the trend computed against `previous`.
    async fn send_price_change(
        &self,
        record: &PriceRecord,
        previous: Decimal,
    ) -> Result<(), NotifyError>;
}

/// `"{title} - {price} {trend}"`, e.g. `"Widget - 1999 🟢"`.
pub fn format_price_message(record: &PriceRecord, previous: Decimal) -> String {
    let trend = Trend::between(record.price, previous);
    format!("{} - {} {}", record.title, record.price, trend)
}

/// Sends price changes to a single Telegram chat.
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PriceNotifier for TelegramNotifier {
    async fn send_price_change(
        &self,
        record: &PriceRecord,
        previous: Decimal,
    ) -> Result<(), NotifyError> {
        let message = format_price_message(record, previous);
        self.client.send_message(&message).await?;
        info!(
            title = record.title.as_str(),
            price = %record.price,
            previous = %previous,
            "Price notification sent"
        );
        Ok(())
    }
}
