//! Token parameters fixed at ledger construction.

use crate::amount::TokenAmount;
use serde::{Deserialize, Serialize};

/// Number of decimal places a display unit carries, as in a standard ERC-20 token.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Who may change total supply through `mint` and `burn`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyPolicy {
    /// Any account may mint to, or burn from, its own balance.
    #[default]
    Open,
    /// Only the ledger owner may mint or burn.
    OwnerOnly,
}

impl SupplyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupplyPolicy::Open => "open",
            SupplyPolicy::OwnerOnly => "owner_only",
        }
    }
}

/// Descriptive metadata and the genesis supply of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Credited in full to the owner account when the ledger is created.
    pub initial_supply: TokenAmount,
    #[serde(default)]
    pub supply_policy: SupplyPolicy,
}

impl TokenParams {
    /// Default metadata with the given initial supply.
    pub fn with_initial_supply(initial_supply: TokenAmount) -> Self {
        Self {
            initial_supply,
            ..Self::default()
        }
    }
}

impl Default for TokenParams {
    fn default() -> Self {
        Self {
            name: "Buidl".to_string(),
            symbol: "BUIDL".to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: TokenAmount::ZERO,
            supply_policy: SupplyPolicy::Open,
        }
    }
}
