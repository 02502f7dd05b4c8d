//! HTTP page fetcher.

use crate::{extract_from_html, ExtractionError};
use async_trait::async_trait;
use pricewatch_core::Target;
use rust_decimal::Decimal;
use std::time::Duration;
use tracing::debug;

/// Browser user agent sent with every page request; some shops refuse
/// clients that do not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

/// Anything that can produce the current price of a target.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn extract_price(&self, target: &Target) -> Result<Decimal, ExtractionError>;
}

/// Configuration for the HTTP extractor.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Fetches target pages over HTTP and reads the price from the markup.
pub struct HttpExtractor {
    http_client: reqwest::Client,
}

impl HttpExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http_client })
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ExtractionError> {
        debug!(url = url, "Fetching page");
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl PriceSource for HttpExtractor {
    async fn extract_price(&self, target: &Target) -> Result<Decimal, ExtractionError> {
        let body = self.fetch_page(&target.url).await?;
        let price = extract_from_html(&body, &target.element)?;
        debug!(title = target.title.as_str(), price = %price, "Extracted price");
        Ok(price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricewatch_core::ElementMatch;
    use pricewatch_testkit::{closed_port_url, serve_once};

    const HTML: &str = "text/html; charset=utf-8";

    fn widget(url: String) -> Target {
        Target::new("Widget", url, ElementMatch::new().with("class_", "price"))
    }

    #[tokio::test]
    async fn test_extract_price_sends_browser_user_agent() {
        let (url, server) =
            serve_once("200 OK", HTML, r#"<p><b class="price">19.99</b></p>"#).await;
        let extractor = HttpExtractor::new(&ExtractorConfig::default()).unwrap();

        let price = extractor.extract_price(&widget(url)).await.unwrap();
        assert_eq!(price, Decimal::from(1999));

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get / http/1.1"));
        assert!(request.contains(&format!("user-agent: {}", DEFAULT_USER_AGENT.to_lowercase())));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let (url, server) = serve_once("403 Forbidden", HTML, "<p>blocked</p>").await;
        let extractor = HttpExtractor::new(&ExtractorConfig::default()).unwrap();

        let err = extractor.extract_price(&widget(url)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Status { status: 403, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_element() {
        let (url, server) = serve_once("200 OK", HTML, "<p>nothing here</p>").await;
        let extractor = HttpExtractor::new(&ExtractorConfig::default()).unwrap();

        let err = extractor.extract_price(&widget(url)).await.unwrap_err();
        assert!(err.is_markup_error());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let url = closed_port_url().await;
        let extractor = HttpExtractor::new(&ExtractorConfig::default()).unwrap();
        let err = extractor.extract_price(&widget(url)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Http(_)));
    }
}
