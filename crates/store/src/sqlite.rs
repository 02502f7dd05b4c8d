//! SQLite storage for targets and prices.

use crate::{system_clock, Clock, PriceStore, StoreError, StoreResult, TargetRegistry};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use pricewatch_core::{ElementMatch, PriceRecord, Target};
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::debug;

type PriceRow = (String, String, String, String);

/// SQLite-backed target registry and price store.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    clock: Clock,
}

impl SqliteStore {
    /// Connect to the database at `database_url` and run migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        Self::connect_with_clock(database_url, system_clock()).await
    }

    pub async fn connect_with_clock(database_url: &str, clock: Clock) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);

        // every connection to an in-memory database is a separate database
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        let store = Self { pool, clock };
        store.run_migrations().await?;
        debug!(url = database_url, "Connected to price database");
        Ok(store)
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS target_items (
                title TEXT PRIMARY KEY NOT NULL,
                url TEXT NOT NULL,
                element TEXT NOT NULL DEFAULT '{}'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_items (
                title TEXT PRIMARY KEY NOT NULL,
                price TEXT NOT NULL,
                created TEXT NOT NULL,
                updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Insert a target or replace the one with the same title.
    pub async fn upsert_target(&self, target: &Target) -> StoreResult<()> {
        let element_json = serde_json::to_string(&target.element).map_err(|e| {
            StoreError::Corrupt {
                title: target.title.clone(),
                reason: e.to_string(),
            }
        })?;

        sqlx::query(
            r#"
            INSERT INTO target_items (title, url, element)
            VALUES (?, ?, ?)
            ON CONFLICT(title) DO UPDATE SET url = excluded.url, element = excluded.element
            "#,
        )
        .bind(&target.title)
        .bind(&target.url)
        .bind(&element_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a target. Returns false if no target had that title.
    pub async fn remove_target(&self, title: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM target_items WHERE title = ?")
            .bind(title)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All stored prices, ordered by title.
    pub async fn list_prices(&self) -> StoreResult<Vec<PriceRecord>> {
        let rows = sqlx::query_as::<_, PriceRow>(
            "SELECT title, price, created, updated FROM price_items ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(record_from_row).collect()
    }

    fn now(&self) -> String {
        format_timestamp((self.clock)())
    }
}

#[async_trait]
impl TargetRegistry for SqliteStore {
    async fn list_targets(&self) -> StoreResult<Vec<Target>> {
        let rows = sqlx::query_as::<_, (String, String, String)>(
            "SELECT title, url, element FROM target_items ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::RegistryRead)?;

        rows.into_iter()
            .map(|(title, url, element_json)| {
                let element: ElementMatch =
                    serde_json::from_str(&element_json).map_err(|e| StoreError::Corrupt {
                        title: title.clone(),
                        reason: format!("element: {}", e),
                    })?;
                Ok(Target {
                    title,
                    url,
                    element,
                })
            })
            .collect()
    }
}

#[async_trait]
impl PriceStore for SqliteStore {
    async fn get_price(&self, title: &str) -> StoreResult<Option<PriceRecord>> {
        let row = sqlx::query_as::<_, PriceRow>(
            "SELECT title, price, created, updated FROM price_items WHERE title = ?",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|source| StoreError::Read {
            title: title.to_string(),
            source,
        })?;

        row.map(record_from_row).transpose()
    }

    async fn create_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord> {
        let now = self.now();

        sqlx::query(
            r#"
            INSERT INTO price_items (title, price, created, updated)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(title) DO UPDATE SET
                price = excluded.price, created = excluded.created, updated = excluded.updated
            "#,
        )
        .bind(title)
        .bind(price.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .map_err(|source| StoreError::Write {
            title: title.to_string(),
            source,
        })?;

        self.get_price(title)
            .await?
            .ok_or_else(|| StoreError::NotFound(title.to_string()))
    }

    async fn update_price(&self, title: &str, price: Decimal) -> StoreResult<PriceRecord> {
        let result = sqlx::query("UPDATE price_items SET price = ?, updated = ? WHERE title = ?")
            .bind(price.to_string())
            .bind(self.now())
            .bind(title)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::Write {
                title: title.to_string(),
                source,
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(title.to_string()));
        }

        self.get_price(title)
            .await?
            .ok_or_else(|| StoreError::NotFound(title.to_string()))
    }
}

/// RFC 3339 in UTC with a fixed width, so text order is time order.
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(title: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            title: title.to_string(),
            reason: format!("timestamp {:?}: {}", value, e),
        })
}

fn record_from_row((title, price, created, updated): PriceRow) -> StoreResult<PriceRecord> {
    let price = Decimal::from_str(&price).map_err(|e| StoreError::Corrupt {
        title: title.clone(),
        reason: format!("price {:?}: {}", price, e),
    })?;
    let created = parse_timestamp(&title, &created)?;
    let updated = parse_timestamp(&title, &updated)?;

    Ok(PriceRecord {
        title,
        price,
        created,
        updated,
    })
}
