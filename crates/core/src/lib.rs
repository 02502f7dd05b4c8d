//! Core data types for the price watcher.

pub mod price;
pub mod target;

pub use price::*;
pub use target::*;
