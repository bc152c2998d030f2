//! Daemon configuration with TOML file support.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use buidl_types::{AccountId, SupplyPolicy, TokenAmount, TokenParams};
use buidl_utils::LogFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for a Buidl ledger daemon.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Token name.
    #[serde(default = "default_name")]
    pub name: String,

    /// Token ticker symbol.
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Display decimals.
    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Raw units credited to `owner` at startup. A TOML integer, or a decimal
    /// string for supplies beyond the 64-bit integer range.
    #[serde(default = "default_initial_supply", with = "raw_supply")]
    pub initial_supply: TokenAmount,

    /// Account that receives the initial supply.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Who may mint and burn.
    #[serde(default)]
    pub supply_policy: SupplyPolicy,

    /// Address the RPC server binds to.
    #[serde(default = "default_bind_address")]
    pub bind_address: IpAddr,

    /// RPC port.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_name() -> String {
    "Buidl".to_string()
}

fn default_symbol() -> String {
    "BUIDL".to_string()
}

fn default_decimals() -> u8 {
    buidl_types::params::DEFAULT_DECIMALS
}

fn default_initial_supply() -> TokenAmount {
    TokenAmount::new(1000)
}

fn default_owner() -> String {
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".to_string()
}

fn default_bind_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_rpc_port() -> u16 {
    7077
}

fn default_log_level() -> String {
    "info".to_string()
}

mod raw_supply {
    use buidl_types::TokenAmount;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Decimal(String),
    }

    pub fn serialize<S: Serializer>(amount: &TokenAmount, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TokenAmount, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Integer(raw) => TokenAmount::try_from(raw).map_err(D::Error::custom),
            Raw::Decimal(text) => text.parse().map_err(D::Error::custom),
        }
    }
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Token parameters for constructing the ledger.
    pub fn token_params(&self) -> TokenParams {
        TokenParams {
            name: self.name.clone(),
            symbol: self.symbol.clone(),
            decimals: self.decimals,
            initial_supply: self.initial_supply,
            supply_policy: self.supply_policy,
        }
    }

    pub fn owner_account(&self) -> AccountId {
        AccountId::new(self.owner.clone())
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.rpc_port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            initial_supply: default_initial_supply(),
            owner: default_owner(),
            supply_policy: SupplyPolicy::default(),
            bind_address: default_bind_address(),
            rpc_port: default_rpc_port(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}
