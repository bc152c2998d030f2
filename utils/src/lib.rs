//! Shared utilities for the Buidl token ledger.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, LogFormat};
pub use stats::StatsCounter;
