//! Stored prices and trend direction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Last known price for a title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub title: String,
    /// Exact decimal, compared by value (`42 == 42.00`).
    pub price: Decimal,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl PriceRecord {
    /// Whether `price` differs from the stored one.
    pub fn differs_from(&self, price: Decimal) -> bool {
        self.price != price
    }
}

/// Direction shown next to a price in a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// `Up` only when strictly greater; equal prices render as `Down`.
    pub fn between(current: Decimal, previous: Decimal) -> Self {
        if current > previous {
            Trend::Up
        } else {
            Trend::Down
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Trend::Up => "\u{1F7E2}",
            Trend::Down => "\u{1F534}",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
