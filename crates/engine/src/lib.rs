//! Price check engine.
//!
//! This crate drives one pass over every registered target: extract the
//! current price, compare it with the stored one, persist and notify.

pub mod error;
pub mod monitor;
pub mod report;

pub use error::*;
pub use monitor::*;
pub use report::*;
