//! In-memory storage for tests.

use crate::{system_clock, Clock, PriceStore, StoreError, StoreResult, TargetRegistry};
use async_trait::async_trait;
use pricewatch_core::{PriceRecord, Target};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Target registry and price store held in process memory.
pub struct MemoryStore {
    targets: RwLock<BTreeMap<String, Target>>,
    prices: RwLock<HashMap<String, PriceRecord>>,
    writes: AtomicUsize,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_clock(system_clock())
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            targets: RwLock::new(BTreeMap::new()),
            prices: RwLock::new(HashMap::new()),
            writes: AtomicUsize::new(0),
            clock,
        }
    }

    pub async fn insert_target(&self, target: Target) {
        self.targets
            .write()
            .await
            .insert(target.title.clone(), target);
    }

    /// Seed a record directly, bypassing the write counter.
    pub async fn insert_record(&self, record: PriceRecord) {
        self.prices
            .write()
            .await
            .insert(record.title.clone(), record);
    }

    /// Number of create/update calls that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TargetRegistry for MemoryStore {
    async fn list_targets(&self) -> StoreResult<Vec<Target>> {
        Ok(self.targets.read().await.values().cloned().collect())
    }
}

#[async_trait]
impl PriceStore for MemoryStore {
    async fn get_price(&self, title: &str) -> StoreResult<Option<PriceRecord>> {
        Ok(self.prices.read().await.get(title).cloned())
    }

    async fn create_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord> {
        let now = (self.clock)();
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.prices.write().await.insert(
            title.to_string(),
            PriceRecord {
                title: title.to_string(),
                price,
                created: now,
                updated: now,
            },
        );

        self.get_price(title)
            .await?
            .ok_or_else(|| StoreError::NotFound(title.to_string()))
    }

    async fn update_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord> {
        let now = (self.clock)();
        self.writes.fetch_add(1, Ordering::SeqCst);
        {
            let mut prices = self.prices.write().await;
            let record = prices
                .get_mut(title)
                .ok_or_else(|| StoreError::NotFound(title.to_string()))?;
            record.price = price;
            record.updated = now;
        }

        self.get_price(title)
            .await?
            .ok_or_else(|| StoreError::NotFound(title.to_string()))
    }
}
