//! Fundamental types for the Buidl token ledger.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! account identifiers, token amounts and their boundary conversions, and token parameters.

pub mod address;
pub mod amount;
pub mod error;
pub mod params;

pub use address::AccountId;
pub use amount::TokenAmount;
pub use error::AmountError;
pub use params::{SupplyPolicy, TokenParams};
