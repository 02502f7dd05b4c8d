//! Telegram Bot API client.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum TelegramError {
    /// Transport failure. The request URL is stripped since it carries the token.
    #[error("Telegram request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("Telegram API rejected message ({status}): {description}")]
    Rejected { status: u16, description: String },
}

/// Bot credentials and destination chat.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Chat ID to send notifications to
    pub chat_id: String,
    /// API base URL, without trailing slash
    pub api_url: String,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into().trim_end_matches('/').to_string();
        self
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_url, self.bot_token)
    }
}

// keep the token out of logs
impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    description: Option<String>,
}

/// Sends plain text messages to the configured chat.
pub struct TelegramClient {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &TelegramConfig {
        &self.config
    }

    /// Send `text` via `sendMessage`.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id: &self.config.chat_id,
            text,
        };

        let response = self
            .http_client
            .post(self.config.send_message_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let description = response
                .json::<ApiResponse>()
                .await
                .ok()
                .and_then(|r| r.description)
                .unwrap_or_else(|| status.to_string());
            return Err(TelegramError::Rejected {
                status: status.as_u16(),
                description,
            });
        }

        debug!(chat_id = self.config.chat_id.as_str(), "Telegram message sent");
        Ok(())
    }
}
