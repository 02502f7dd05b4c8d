//! Price monitor.
//!
//! Walks the target registry one target at a time. Each target goes through
//! extract → compare → persist → notify before the next one starts.

use crate::{FailedTarget, MonitorError, MonitorResult, Outcome, RunReport};
use pricewatch_alerts::PriceNotifier;
use pricewatch_core::{PriceRecord, Target};
use pricewatch_extractor::PriceSource;
use pricewatch_store::{PriceStore, StoreError, TargetRegistry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Which price an update notification's trend is computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrendBaseline {
    /// Compare the new price with itself. Updates therefore always show the
    /// down symbol; this matches the long-standing message format.
    #[default]
    NewPrice,
    /// Compare the new price with the one stored before the update.
    StoredPrice,
}

#[derive(Debug, Error)]
#[error("Unknown trend baseline {0:?} (expected \"new\" or \"stored\")")]
pub struct UnknownTrendBaseline(String);

impl FromStr for TrendBaseline {
    type Err = UnknownTrendBaseline;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "new" | "new_price" => Ok(TrendBaseline::NewPrice),
            "stored" | "stored_price" | "previous" => Ok(TrendBaseline::StoredPrice),
            _ => Err(UnknownTrendBaseline(s.to_string())),
        }
    }
}

impl fmt::Display for TrendBaseline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendBaseline::NewPrice => f.write_str("new"),
            TrendBaseline::StoredPrice => f.write_str("stored"),
        }
    }
}

/// Configuration for the monitor.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub trend_baseline: TrendBaseline,
    /// Log a failing target and move on instead of aborting the run.
    pub isolate_failures: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            trend_baseline: TrendBaseline::NewPrice,
            isolate_failures: true,
        }
    }
}

/// Runs price checks over every registered target.
pub struct Monitor {
    registry: Arc<dyn TargetRegistry>,
    store: Arc<dyn PriceStore>,
    source: Arc<dyn PriceSource>,
    notifier: Arc<dyn PriceNotifier>,
    config: MonitorConfig,
}

impl Monitor {
    pub fn new(
        registry: Arc<dyn TargetRegistry>,
        store: Arc<dyn PriceStore>,
        source: Arc<dyn PriceSource>,
        notifier: Arc<dyn PriceNotifier>,
        config: MonitorConfig,
    ) -> Self {
        Self {
            registry,
            store,
            source,
            notifier,
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Check every registered target once.
    ///
    /// Only a registry failure is fatal when failures are isolated.
    pub async fn run(&self) -> MonitorResult<RunReport> {
        let targets = self
            .registry
            .list_targets()
            .await
            .map_err(MonitorError::Registry)?;

        info!(targets = targets.len(), "Starting price check");

        let mut report = RunReport::default();
        for target in &targets {
            match self.process_target(target).await {
                Ok(outcome) => report.record(&outcome),
                Err(e) if self.config.isolate_failures => {
                    error!(title = target.title.as_str(), error = %e, "Price check failed");
                    report.record_failure(target.title.as_str(), &e);
                }
                Err(e) => return Err(e),
            }
        }

        if !report.is_clean() {
            let titles: Vec<&str> = report
                .failed
                .iter()
                .map(|FailedTarget { title, .. }| title.as_str())
                .collect();
            warn!(failed = report.failed.len(), titles = ?titles, "Some targets failed");
        }

        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            failed = report.failed.len(),
            "Price check finished"
        );

        Ok(report)
    }

    /// Extract, compare, persist and notify for a single target.
    pub async fn process_target(&self, target: &Target) -> MonitorResult<Outcome> {
        let title = target.title.as_str();

        let price = self
            .source
            .extract_price(target)
            .await
            .map_err(|source| MonitorError::Extraction {
                title: title.to_string(),
                source,
            })?;

        let existing = self
            .store
            .get_price(title)
            .await
            .map_err(|e| store_error(title, e))?;

        match existing {
            None => {
                let record = self
                    .store
                    .create_price(title, price)
                    .await
                    .map_err(|e| store_error(title, e))?;
                info!(title = title, price = %record.price, "First price recorded");

                self.notify(&record, Decimal::ZERO).await?;
                Ok(Outcome::Created(record))
            }
            Some(existing) if existing.differs_from(price) => {
                let record = self
                    .store
                    .update_price(title, price)
                    .await
                    .map_err(|e| store_error(title, e))?;
                info!(
                    title = title,
                    price = %record.price,
                    previous = %existing.price,
                    "Price changed"
                );

                let baseline = match self.config.trend_baseline {
                    TrendBaseline::NewPrice => price,
                    TrendBaseline::StoredPrice => existing.price,
                };
                self.notify(&record, baseline).await?;
                Ok(Outcome::Updated {
                    record,
                    previous: existing.price,
                })
            }
            Some(_) => {
                debug!(title = title, price = %price, "Price unchanged");
                Ok(Outcome::Unchanged(price))
            }
        }
    }

    async fn notify(&self, record: &PriceRecord, previous: Decimal) -> MonitorResult<()> {
        self.notifier
            .send_price_change(record, previous)
            .await
            .map_err(|source| MonitorError::Notify {
                title: record.title.clone(),
                source,
            })
    }
}

fn store_error(title: &str, source: StoreError) -> MonitorError {
    MonitorError::Store {
        title: title.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use pricewatch_alerts::{format_price_message, NotifyError, TelegramError};
    use pricewatch_core::ElementMatch;
    use pricewatch_extractor::ExtractionError;
    use pricewatch_store::{Clock, MemoryStore, StoreResult};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Mutex;

    /// Prices keyed by title; unknown titles fail like a page without the element.
    struct StaticSource {
        prices: HashMap<String, Decimal>,
    }

    impl StaticSource {
        fn new(prices: &[(&str, i64)]) -> Self {
            Self {
                prices: prices
                    .iter()
                    .map(|(title, price)| (title.to_string(), Decimal::from(*price)))
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn extract_price(&self, target: &Target) -> Result<Decimal, ExtractionError> {
            self.prices
                .get(&target.title)
                .copied()
                .ok_or_else(|| ExtractionError::NoMatch(r#"[class~="price"]"#.to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<(String, Decimal, Decimal, String)>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn sent(&self) -> Vec<(String, Decimal, Decimal, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PriceNotifier for RecordingNotifier {
        async fn send_price_change(
            &self,
            record: &PriceRecord,
            previous: Decimal,
        ) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Telegram(TelegramError::Rejected {
                    status: 401,
                    description: "Unauthorized".to_string(),
                }));
            }
            self.sent.lock().unwrap().push((
                record.title.clone(),
                record.price,
                previous,
                format_price_message(record, previous),
            ));
            Ok(())
        }
    }

    struct BrokenRegistry;

    #[async_trait]
    impl TargetRegistry for BrokenRegistry {
        async fn list_targets(&self) -> StoreResult<Vec<Target>> {
            Err(StoreError::Corrupt {
                title: "Widget".to_string(),
                reason: "element: expected map".to_string(),
            })
        }
    }

    fn stepping_clock() -> Clock {
        let tick = Arc::new(AtomicI64::new(0));
        Arc::new(move || {
            let n = tick.fetch_add(1, Ordering::SeqCst);
            Utc.timestamp_opt(1_700_000_000 + n * 60, 0).unwrap()
        })
    }

    fn target(title: &str) -> Target {
        Target::new(
            title,
            format!("http://shop.test/{}", title.to_lowercase()),
            ElementMatch::new().with("class_", "price"),
        )
    }

    async fn store_with(titles: &[&str]) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::with_clock(stepping_clock()));
        for title in titles {
            store.insert_target(target(title)).await;
        }
        store
    }

    fn build_monitor(
        store: &Arc<MemoryStore>,
        source: StaticSource,
        notifier: &Arc<RecordingNotifier>,
        config: MonitorConfig,
    ) -> Monitor {
        Monitor::new(
            store.clone(),
            store.clone(),
            Arc::new(source),
            notifier.clone(),
            config,
        )
    }

    #[tokio::test]
    async fn test_first_price_creates_and_notifies_up() {
        let store = store_with(&["Widget"]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 1999)]),
            &notifier,
            MonitorConfig::default(),
        );

        let report = monitor.run().await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.total(), 1);

        let record = store.get_price("Widget").await.unwrap().unwrap();
        assert_eq!(record.price, Decimal::from(1999));
        assert_eq!(record.created, record.updated);
        assert_eq!(store.write_count(), 1);

        assert_eq!(
            notifier.sent(),
            vec![(
                "Widget".to_string(),
                Decimal::from(1999),
                Decimal::ZERO,
                "Widget - 1999 🟢".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn test_unchanged_price_writes_and_sends_nothing() {
        let store = store_with(&["Widget"]).await;
        let seeded = PriceRecord {
            title: "Widget".to_string(),
            price: Decimal::from_str("1999.00").unwrap(),
            created: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
            updated: Utc.timestamp_opt(1_600_000_000, 0).unwrap(),
        };
        store.insert_record(seeded.clone()).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 1999)]),
            &notifier,
            MonitorConfig::default(),
        );

        let report = monitor.run().await.unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(store.write_count(), 0);
        assert!(notifier.sent().is_empty());
        assert_eq!(store.get_price("Widget").await.unwrap().unwrap(), seeded);
    }

    #[tokio::test]
    async fn test_changed_price_updates_with_new_price_baseline() {
        let store = store_with(&["Widget"]).await;
        let created = store.create_price("Widget", Decimal::from(1999)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 2499)]),
            &notifier,
            MonitorConfig::default(),
        );

        let outcome = monitor.process_target(&target("Widget")).await.unwrap();
        let Outcome::Updated { record, previous } = outcome else {
            panic!("expected an update");
        };
        assert_eq!(previous, Decimal::from(1999));
        assert_eq!(record.price, Decimal::from(2499));
        assert_eq!(record.created, created.created);
        assert!(record.updated > created.updated);
        assert_eq!(store.write_count(), 2);

        // the new price is its own baseline, so even a rise shows as down
        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, Decimal::from(2499));
        assert_eq!(sent[0].3, "Widget - 2499 🔴");
    }

    #[tokio::test]
    async fn test_stored_price_baseline() {
        let store = store_with(&["Widget"]).await;
        store.create_price("Widget", Decimal::from(1999)).await.unwrap();
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 2499)]),
            &notifier,
            MonitorConfig {
                trend_baseline: TrendBaseline::StoredPrice,
                ..Default::default()
            },
        );

        monitor.run().await.unwrap();

        let sent = notifier.sent();
        assert_eq!(sent[0].2, Decimal::from(1999));
        assert_eq!(sent[0].3, "Widget - 2499 🟢");
    }

    #[tokio::test]
    async fn test_failing_target_is_isolated() {
        let store = store_with(&["Broken", "Widget"]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 10)]),
            &notifier,
            MonitorConfig::default(),
        );

        let report = monitor.run().await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].title, "Broken");
        assert!(report.failed[0].error.contains("No element matches"));
        assert!(store.get_price("Broken").await.unwrap().is_none());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_aborts_without_isolation() {
        let store = store_with(&["Broken", "Widget"]).await;
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 10)]),
            &notifier,
            MonitorConfig {
                isolate_failures: false,
                ..Default::default()
            },
        );

        let err = monitor.run().await.unwrap_err();
        assert!(matches!(err, MonitorError::Extraction { .. }));
        assert_eq!(err.title(), Some("Broken"));
        // targets run in title order, so Widget was never reached
        assert!(store.get_price("Widget").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_failure_is_fatal() {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let monitor = Monitor::new(
            Arc::new(BrokenRegistry),
            store,
            Arc::new(StaticSource::new(&[])),
            notifier,
            MonitorConfig::default(),
        );

        let err = monitor.run().await.unwrap_err();
        assert!(matches!(err, MonitorError::Registry(_)));
        assert_eq!(err.title(), None);
    }

    #[tokio::test]
    async fn test_notify_failure_keeps_written_price() {
        let store = store_with(&["Widget"]).await;
        let notifier = Arc::new(RecordingNotifier::failing());
        let monitor = build_monitor(
            &store,
            StaticSource::new(&[("Widget", 5)]),
            &notifier,
            MonitorConfig::default(),
        );

        let report = monitor.run().await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].error.starts_with("Notification failed for Widget"));
        assert_eq!(
            store.get_price("Widget").await.unwrap().unwrap().price,
            Decimal::from(5)
        );
    }

    #[test]
    fn test_trend_baseline_parse() {
        assert_eq!("new".parse::<TrendBaseline>().unwrap(), TrendBaseline::NewPrice);
        assert_eq!(" Stored ".parse::<TrendBaseline>().unwrap(), TrendBaseline::StoredPrice);
        assert!("sideways".parse::<TrendBaseline>().is_err());
        assert_eq!(TrendBaseline::StoredPrice.to_string(), "stored");
    }
}
