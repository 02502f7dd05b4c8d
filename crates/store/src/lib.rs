//! Persistence for monitored targets and last known prices.
//!
//! This crate provides:
//! - `TargetRegistry` and `PriceStore` traits used by the monitor
//! - SQLite-backed storage for the binary
//! - In-memory storage for tests

pub mod clock;
pub mod error;
pub mod memory;
pub mod sqlite;

pub use clock::{system_clock, Clock};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use pricewatch_core::{PriceRecord, Target};
use rust_decimal::Decimal;

/// Source of the targets to monitor.
#[async_trait]
pub trait TargetRegistry: Send + Sync {
    /// All registered targets, in one bulk read.
    async fn list_targets(&self) -> StoreResult<Vec<Target>>;
}

/// Last known price per title.
#[async_trait]
pub trait PriceStore: Send + Sync {
    /// `Ok(None)` when no price has been recorded for `title`.
    async fn get_price(&self, title: &str) -> StoreResult<Option<PriceRecord>>;

    /// Record a first price; `created` and `updated` are both set to now.
    /// Returns the record as read back from the store.
    async fn create_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord>;

    /// Overwrite the price of an existing record and bump `updated`.
    /// Returns the record as read back from the store.
    async fn update_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord>;
}
