//! Fungible-token ledger.
//!
//! A single accounting structure tracking per-holder balances, the total
//! issued supply, and per-owner spending delegations (allowances).
//!
//! This crate handles:
//! - Minting and burning supply against the caller's own balance
//! - Direct transfers between holders
//! - Approvals and delegated transfers that consume them
//! - Transfer/approval events for committed transitions
//! - A lock-serialized handle for concurrent callers
//!
//! Invariant after every operation: `total_supply == Σ balances`.

pub mod error;
pub mod event;
pub mod ledger;
pub mod shared;

pub use error::LedgerError;
pub use event::{EventBus, EventListener, LedgerEvent};
pub use ledger::{Ledger, LedgerSnapshot};
pub use shared::SharedLedger;
