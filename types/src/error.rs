//! Errors raised while turning caller-supplied numbers into amounts.

use thiserror::Error;

/// Rejection of an amount at the decoding boundary, before any ledger is touched.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Negative, fractional, non-finite, or wider than the amount type.
    #[error("value out-of-bounds: {value}")]
    ValueOutOfBounds { value: String },

    /// Not a number at all.
    #[error("malformed amount: {0:?}")]
    Malformed(String),
}

impl AmountError {
    pub(crate) fn out_of_bounds(value: impl ToString) -> Self {
        Self::ValueOutOfBounds {
            value: value.to_string(),
        }
    }
}
