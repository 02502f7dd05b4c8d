//! Telegram notifications for price changes.
//!
//! This crate provides:
//! - A minimal Telegram Bot API client
//! - Price change message formatting
//! - The `PriceNotifier` seam used by the monitor

pub mod notifier;
pub mod telegram;

pub use notifier::{format_price_message, NotifyError, PriceNotifier, TelegramNotifier};
pub use telegram::{TelegramClient, TelegramConfig, TelegramError, DEFAULT_API_URL};
