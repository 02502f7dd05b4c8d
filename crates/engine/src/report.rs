//! Per-run summary.

use pricewatch_core::PriceRecord;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What happened to a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// First price seen for the title.
    Created(PriceRecord),
    /// Price changed; `previous` is the price stored before the update.
    Updated {
        record: PriceRecord,
        previous: Decimal,
    },
    /// Extracted price equals the stored one.
    Unchanged(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedTarget {
    pub title: String,
    pub error: String,
}

/// Counts for one pass over the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: Vec<FailedTarget>,
}

impl RunReport {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Created(_) => self.created += 1,
            Outcome::Updated { .. } => self.updated += 1,
            Outcome::Unchanged(_) => self.unchanged += 1,
        }
    }

    pub fn record_failure(&mut self, title: impl Into<String>, error: impl ToString) {
        self.failed.push(FailedTarget {
            title: title.into(),
            error: error.to_string(),
        });
    }

    /// Number of targets processed, failed ones included.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failed.len()
    }

    /// Number of notifications that were sent.
    pub fn notified(&self) -> usize {
        self.created + self.updated
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let mut report = RunReport::default();
        report.record(&Outcome::Unchanged(Decimal::ONE));
        report.record(&Outcome::Unchanged(Decimal::TWO));
        report.record_failure("Broken", "No element matches .price");

        assert_eq!(report.unchanged, 2);
        assert_eq!(report.total(), 3);
        assert_eq!(report.notified(), 0);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_report_serializes() {
        let report = RunReport {
            created: 1,
            ..Default::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["created"], 1);
        assert!(json["failed"].as_array().unwrap().is_empty());
    }
}
