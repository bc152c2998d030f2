//! Ledger rejection reasons.

use buidl_types::{AccountId, TokenAmount};
use thiserror::Error;

/// Why a ledger operation was rejected. A rejected operation changes nothing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: need {needed}, have {available}")]
    InsufficientBalance {
        account: AccountId,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("insufficient allowance for {spender} on {owner}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("arithmetic overflow: amount exceeds the representable maximum")]
    Overflow,

    #[error("{caller} is not authorized to change supply")]
    Unauthorized { caller: AccountId },
}
