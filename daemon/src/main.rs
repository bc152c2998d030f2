//! Buidl daemon: entry point for serving a token ledger.

mod config;

use std::net::IpAddr;
use std::path::PathBuf;

use buidl_ledger::{Ledger, SharedLedger};
use buidl_rpc::RpcServer;
use buidl_types::{SupplyPolicy, TokenAmount};
use buidl_utils::LogFormat;
use clap::Parser;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "buidl-daemon", about = "Buidl token ledger daemon")]
struct Cli {
    /// Path to a TOML configuration file. File settings are the base;
    /// CLI flags and env vars override them.
    #[arg(long, env = "BUIDL_CONFIG")]
    config: Option<PathBuf>,

    /// Address the RPC server binds to.
    #[arg(long, env = "BUIDL_BIND")]
    bind: Option<IpAddr>,

    /// RPC server port.
    #[arg(long, env = "BUIDL_RPC_PORT")]
    rpc_port: Option<u16>,

    /// Account credited with the initial supply.
    #[arg(long, env = "BUIDL_OWNER")]
    owner: Option<String>,

    /// Initial supply in raw units.
    #[arg(long, env = "BUIDL_INITIAL_SUPPLY")]
    initial_supply: Option<TokenAmount>,

    /// Restrict mint and burn to the owner account.
    #[arg(long, env = "BUIDL_OWNER_ONLY_SUPPLY")]
    owner_only_supply: bool,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "BUIDL_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "BUIDL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Create the ledger and serve RPC until interrupted.
    Run,
}

impl Cli {
    /// Merge CLI overrides on top of the file (or default) configuration.
    fn resolve_config(&self) -> anyhow::Result<DaemonConfig> {
        let base = match &self.config {
            Some(path) => DaemonConfig::from_toml_file(path)?,
            None => DaemonConfig::default(),
        };
        Ok(DaemonConfig {
            bind_address: self.bind.unwrap_or(base.bind_address),
            rpc_port: self.rpc_port.unwrap_or(base.rpc_port),
            owner: self.owner.clone().unwrap_or(base.owner),
            initial_supply: self.initial_supply.unwrap_or(base.initial_supply),
            supply_policy: if self.owner_only_supply {
                SupplyPolicy::OwnerOnly
            } else {
                base.supply_policy
            },
            log_level: self.log_level.clone().unwrap_or(base.log_level),
            log_format: self.log_format.unwrap_or(base.log_format),
            ..base
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    buidl_utils::init_logging(config.log_format, &config.log_level);

    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Run => {
            let params = config.token_params();
            let owner = config.owner_account();
            tracing::info!(
                "Creating {} ({}) ledger: {} raw units to {}, supply policy {}",
                params.name,
                params.symbol,
                params.initial_supply,
                owner,
                params.supply_policy.as_str(),
            );
            let ledger = SharedLedger::new(Ledger::with_params(params, owner));

            let server = RpcServer::new(config.rpc_addr(), ledger);
            server
                .serve(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::warn!("Failed to listen for shutdown signal: {e}");
                    }
                    tracing::info!("Shutdown signal received, stopping RPC server");
                })
                .await?;

            tracing::info!("Buidl daemon exited cleanly");
        }
    }

    Ok(())
}
