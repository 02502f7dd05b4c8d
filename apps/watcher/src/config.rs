//! Application configuration.
//!
//! Everything is read from the environment once at startup and passed down
//! explicitly.

use pricewatch_alerts::{TelegramConfig, DEFAULT_API_URL};
use pricewatch_engine::{MonitorConfig, TrendBaseline};
use pricewatch_extractor::{ExtractorConfig, DEFAULT_USER_AGENT};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://price-watch.db";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value {value:?} for {name}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// sqlx connection string for the target and price tables.
    pub database_url: String,
    /// Page fetch settings.
    pub extractor: ExtractorConfig,
    /// Run behaviour.
    pub monitor: MonitorConfig,
    /// Bot credentials, or why they are unavailable. Only the `run`
    /// command needs them.
    pub telegram: Result<TelegramConfig, ConfigError>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            extractor: ExtractorConfig::default(),
            monitor: MonitorConfig::default(),
            telegram: Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN")),
        }
    }
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from any name → value lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let timeout_secs = match get("PRICE_WATCH_TIMEOUT_SECS") {
            Some(value) => value.trim().parse::<u64>().map_err(|e| ConfigError::Invalid {
                name: "PRICE_WATCH_TIMEOUT_SECS",
                value: value.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let trend_baseline = match get("PRICE_WATCH_TREND_BASELINE") {
            Some(value) => value
                .parse::<TrendBaseline>()
                .map_err(|e| ConfigError::Invalid {
                    name: "PRICE_WATCH_TREND_BASELINE",
                    value: value.clone(),
                    reason: e.to_string(),
                })?,
            None => TrendBaseline::default(),
        };

        let telegram = match (get("TELEGRAM_BOT_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Ok(TelegramConfig::new(token, chat_id).with_api_url(
                get("TELEGRAM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            )),
            (None, _) => Err(ConfigError::Missing("TELEGRAM_BOT_TOKEN")),
            (_, None) => Err(ConfigError::Missing("TELEGRAM_CHAT_ID")),
        };

        Ok(Self {
            database_url,
            extractor: ExtractorConfig {
                user_agent: get("PRICE_WATCH_USER_AGENT")
                    .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
            monitor: MonitorConfig {
                trend_baseline,
                ..Default::default()
            },
            telegram,
        })
    }

    /// Telegram settings, or the first missing variable.
    pub fn require_telegram(&self) -> Result<&TelegramConfig, ConfigError> {
        self.telegram.as_ref().map_err(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.extractor.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.extractor.timeout, Duration::from_secs(30));
        assert_eq!(config.monitor.trend_baseline, TrendBaseline::NewPrice);
        assert!(config.monitor.isolate_failures);
        assert_eq!(
            config.require_telegram().unwrap_err(),
            ConfigError::Missing("TELEGRAM_BOT_TOKEN")
        );
    }

    #[test]
    fn test_full_environment() {
        let config = AppConfig::from_lookup(lookup(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-100500"),
            ("TELEGRAM_API_URL", "http://127.0.0.1:9000/"),
            ("DATABASE_URL", "sqlite::memory:"),
            ("PRICE_WATCH_TIMEOUT_SECS", "5"),
            ("PRICE_WATCH_TREND_BASELINE", "stored"),
            ("PRICE_WATCH_USER_AGENT", "curl/8"),
        ]))
        .unwrap();

        let telegram = config.require_telegram().unwrap();
        assert_eq!(telegram.bot_token, "123:abc");
        assert_eq!(telegram.chat_id, "-100500");
        assert_eq!(telegram.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.extractor.timeout, Duration::from_secs(5));
        assert_eq!(config.extractor.user_agent, "curl/8");
        assert_eq!(config.monitor.trend_baseline, TrendBaseline::StoredPrice);
    }

    #[test]
    fn test_partial_telegram_is_missing() {
        let config =
            AppConfig::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "123:abc"), ("TELEGRAM_CHAT_ID", " ")]))
                .unwrap();
        assert_eq!(
            config.require_telegram().unwrap_err(),
            ConfigError::Missing("TELEGRAM_CHAT_ID")
        );
    }

    #[test]
    fn test_invalid_values() {
        let err = AppConfig::from_lookup(lookup(&[("PRICE_WATCH_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PRICE_WATCH_TIMEOUT_SECS", .. }));

        let err =
            AppConfig::from_lookup(lookup(&[("PRICE_WATCH_TREND_BASELINE", "sideways")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PRICE_WATCH_TREND_BASELINE", .. }));
    }
}
