//! Token amount type and its boundary conversions.
//!
//! Amounts are fixed-width unsigned integers (u128) counted in raw units, so a
//! negative balance or allowance cannot be represented. Values arriving from
//! callers in signed, floating-point, or textual form go through the `TryFrom`
//! and `FromStr` impls here, which reject anything the type cannot hold with
//! [`AmountError::ValueOutOfBounds`].

use crate::error::AmountError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A quantity of tokens in raw units.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);
    pub const MAX: Self = Self(u128::MAX);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TokenAmount {
    fn from(raw: u64) -> Self {
        Self(u128::from(raw))
    }
}

impl From<u128> for TokenAmount {
    fn from(raw: u128) -> Self {
        Self(raw)
    }
}

impl TryFrom<i64> for TokenAmount {
    type Error = AmountError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Self::from)
            .map_err(|_| AmountError::out_of_bounds(value))
    }
}

impl TryFrom<i128> for TokenAmount {
    type Error = AmountError;

    fn try_from(value: i128) -> Result<Self, Self::Error> {
        u128::try_from(value)
            .map(Self)
            .map_err(|_| AmountError::out_of_bounds(value))
    }
}

impl TryFrom<f64> for TokenAmount {
    type Error = AmountError;

    /// Accepts only finite, non-negative, integral values below 2^128.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(AmountError::out_of_bounds(value));
        }
        // `u128::MAX as f64` rounds up to exactly 2^128.
        if value >= u128::MAX as f64 {
            return Err(AmountError::out_of_bounds(value));
        }
        Ok(Self(value as u128))
    }
}

impl FromStr for TokenAmount {
    type Err = AmountError;

    /// Parse a decimal integer such as `"1000"`, `"+5"` or `"10.000"`.
    ///
    /// A negative non-zero value, a non-zero fractional part, or a value wider
    /// than u128 is out of bounds. `"-0"` is zero, like `-0.0` is for
    /// `TryFrom<f64>`. Anything that is not a decimal number is malformed.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = match unsigned.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction)
        {
            return Err(AmountError::Malformed(s.to_owned()));
        }
        if fraction.bytes().any(|b| b != b'0') {
            return Err(AmountError::out_of_bounds(trimmed));
        }
        if whole.bytes().all(|b| b == b'0') {
            return Ok(Self::ZERO);
        }
        if negative {
            return Err(AmountError::out_of_bounds(trimmed));
        }
        whole
            .parse::<u128>()
            .map(Self)
            .map_err(|_| AmountError::out_of_bounds(trimmed))
    }
}
