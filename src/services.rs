//! Service initialization - external handles needed by every cycle

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::Settings;
use crate::market::MarketDataClient;
use crate::rpc::RpcConnection;

/// Failure to bring up the external handles; unrecoverable for the
/// current start attempt
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("RPC connection failed: {0}")]
    Connection(String),

    #[error("wallet unavailable: {0}")]
    Wallet(String),

    #[error("market data client failed: {0}")]
    MarketData(String),
}

/// What the bot is allowed to do this run, decided once at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    /// Analysis only; opportunities are reported, never acted on
    Monitoring,
    /// Analysis plus strategy execution
    Trading,
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperatingMode::Monitoring => write!(f, "monitoring"),
            OperatingMode::Trading => write!(f, "trading"),
        }
    }
}

/// Wallet snapshot taken at initialization
#[derive(Debug, Clone)]
pub struct WalletInfo {
    pub address: String,
    pub balance_sol: Decimal,
    /// Balance covers the configured fee floor
    pub sufficient: bool,
}

/// Immutable bundle of initialized handles, shared by every cycle of one
/// run and discarded on stop
pub struct ServiceSet {
    pub rpc: RpcConnection,
    pub wallet: WalletInfo,
    pub mode: OperatingMode,
    pub market: MarketDataClient,
}

/// Bring up connection, wallet and market data handles, failing fast if
/// any of them cannot be created
///
/// An insufficient balance is a reported condition, not a failure: the
/// bot still starts, in monitoring mode.
pub async fn initialize_services(settings: &Settings) -> Result<ServiceSet, InitError> {
    let rpc = RpcConnection::new(&settings.rpc_url)
        .map_err(|e| InitError::Connection(e.to_string()))?;

    rpc.get_health()
        .await
        .map_err(|e| InitError::Connection(format!("{} unreachable: {}", settings.rpc_url, e)))?;

    let address = settings
        .wallet_address
        .clone()
        .ok_or_else(|| InitError::Wallet("WALLET_ADDRESS is not set".to_string()))?;

    let balance_sol = rpc
        .get_balance(&address)
        .await
        .map_err(|e| InitError::Wallet(format!("balance check for {} failed: {}", address, e)))?;

    let sufficient = balance_sol >= settings.min_balance_sol;
    if !sufficient {
        warn!(
            "Wallet {} holds {} SOL, below the {} SOL floor - forcing monitoring mode",
            address, balance_sol, settings.min_balance_sol
        );
    }

    let mode = if settings.trading_enabled && sufficient {
        OperatingMode::Trading
    } else {
        OperatingMode::Monitoring
    };

    let market = MarketDataClient::new(&settings.market_data_url)
        .map_err(|e| InitError::MarketData(e.to_string()))?;

    info!(
        "✓ Services initialized | network: {} | wallet: {} ({} SOL) | mode: {}",
        settings.network, address, balance_sol, mode
    );

    Ok(ServiceSet {
        rpc,
        wallet: WalletInfo {
            address,
            balance_sol,
            sufficient,
        },
        mode,
        market,
    })
}
