//! Wall-clock source for record timestamps.

use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Function returning the timestamp to stamp on a write.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}
