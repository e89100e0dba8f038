//! Bot configuration loaded from the environment

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

/// Solana cluster the bot operates against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Devnet,
}

impl Network {
    /// Public RPC endpoint for the cluster, used when SOLANA_RPC_URL is not set
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Devnet => "https://api.devnet.solana.com",
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "mainnet-beta" => Ok(Network::Mainnet),
            "devnet" => Ok(Network::Devnet),
            other => Err(anyhow::anyhow!("unknown network: {}", other)),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Devnet => write!(f, "devnet"),
        }
    }
}

/// Runtime settings, resolved once at boot
#[derive(Debug, Clone)]
pub struct Settings {
    pub network: Network,
    pub rpc_url: String,
    pub market_data_url: String,
    pub wallet_address: Option<String>,
    /// Wall-clock period between analysis cycles
    pub analysis_interval: Duration,
    pub trading_enabled: bool,
    /// Minimum score a token needs to be considered an opportunity
    pub min_score: f64,
    pub max_positions: usize,
    /// Cash spent per entry, in USD
    pub trade_amount_usd: Decimal,
    /// Starting cash for the paper ledger
    pub paper_equity_usd: Decimal,
    /// SOL balance below which the bot refuses to trade (fees)
    pub min_balance_sol: Decimal,
    pub stop_loss_pct: Decimal,
    pub take_profit_pct: Decimal,
    /// Token mints to analyze each cycle
    pub watchlist: Vec<String>,
    pub audit_dir: PathBuf,
}

impl Settings {
    /// Load settings from environment variables, applying defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let network: Network = parse_env("NETWORK", Network::Mainnet)?;

        let rpc_url = std::env::var("SOLANA_RPC_URL")
            .unwrap_or_else(|_| network.default_rpc_url().to_string());

        let market_data_url = std::env::var("MARKET_DATA_URL")
            .unwrap_or_else(|_| "https://api.dexscreener.com".to_string());

        let wallet_address = std::env::var("WALLET_ADDRESS").ok();

        let interval_minutes: u64 = parse_env("ANALYSIS_INTERVAL_MINUTES", 5)?;
        anyhow::ensure!(
            interval_minutes >= 1,
            "ANALYSIS_INTERVAL_MINUTES must be at least 1"
        );

        let trading_enabled = std::env::var("TRADING_ENABLED")
            .map(|v| parse_bool(&v))
            .unwrap_or(false);

        let min_score: f64 = parse_env("MIN_SCORE", 5.0)?;
        let max_positions: usize = parse_env("MAX_POSITIONS", 3)?;
        let trade_amount_usd: Decimal = parse_env("TRADE_AMOUNT_USD", Decimal::from(100))?;
        let paper_equity_usd: Decimal = parse_env("PAPER_EQUITY_USD", Decimal::from(10_000))?;
        let min_balance_sol: Decimal = parse_env("MIN_BALANCE_SOL", Decimal::new(5, 2))?;
        let stop_loss_pct: Decimal = parse_env("STOP_LOSS_PCT", Decimal::from(10))?;
        let take_profit_pct: Decimal = parse_env("TAKE_PROFIT_PCT", Decimal::from(25))?;

        let watchlist = std::env::var("WATCHLIST")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| default_watchlist());

        let audit_dir = std::env::var("AUDIT_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("logs"));

        Ok(Self {
            network,
            rpc_url,
            market_data_url,
            wallet_address,
            analysis_interval: Duration::from_secs(interval_minutes * 60),
            trading_enabled,
            min_score,
            max_positions,
            trade_amount_usd,
            paper_equity_usd,
            min_balance_sol,
            stop_loss_pct,
            take_profit_pct,
            watchlist,
            audit_dir,
        })
    }
}

/// Default watchlist: a handful of liquid mainnet tokens
fn default_watchlist() -> Vec<String> {
    vec![
        // SOL
        "So11111111111111111111111111111111111111112".to_string(),
        // JUP
        "JUPyiwrYJFskUPiHa7hkeR8VUtAeFoSYbKedZNsDvCN".to_string(),
        // BONK
        "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string(),
        // WIF
        "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm".to_string(),
    ]
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_env<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
