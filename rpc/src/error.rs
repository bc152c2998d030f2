//! RPC error types.

use buidl_ledger::LedgerError;
use buidl_types::AmountError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    /// Stable machine-readable error kind, for callers to branch on.
    pub fn kind(&self) -> &'static str {
        match self {
            RpcError::Amount(AmountError::ValueOutOfBounds { .. }) => "value_out_of_bounds",
            RpcError::Amount(AmountError::Malformed(_)) => "malformed_amount",
            RpcError::Ledger(LedgerError::InsufficientBalance { .. }) => "insufficient_balance",
            RpcError::Ledger(LedgerError::InsufficientAllowance { .. }) => "insufficient_allowance",
            RpcError::Ledger(LedgerError::Overflow) => "overflow",
            RpcError::Ledger(LedgerError::Unauthorized { .. }) => "unauthorized",
            RpcError::InvalidRequest(_) => "invalid_request",
            RpcError::Server(_) => "server_error",
        }
    }

    /// Whether the ledger rejected the operation, as opposed to the request
    /// never reaching it.
    pub fn is_ledger_rejection(&self) -> bool {
        matches!(self, RpcError::Ledger(_))
    }
}
