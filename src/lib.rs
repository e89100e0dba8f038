//! trade-runner - automated token trading bot
//!
//! The orchestration core:
//! 1. Initializes external services (RPC connection, wallet, market data)
//! 2. Runs analysis-then-trade cycles on a fixed interval
//! 3. Tracks open positions in a process-wide book
//! 4. Guarantees clean start/stop semantics, including graceful shutdown
//!    while positions are open

pub mod analyzer;
pub mod audit;
pub mod config;
pub mod cycle;
pub mod market;
pub mod positions;
pub mod rpc;
pub mod scheduler;
pub mod services;
pub mod trader;

// Re-export main types for convenience
pub use analyzer::{perform_analysis, ScoredToken};
pub use audit::{AnalysisRecord, AuditLog, TradeRecord};
pub use config::{Network, Settings};
pub use cycle::{run_cycle, CycleOutcome, CycleReport};
pub use market::MarketDataClient;
pub use positions::{Position, PositionBook};
pub use rpc::RpcConnection;
pub use scheduler::{Bot, StartOutcome, StopSummary};
pub use services::{initialize_services, InitError, OperatingMode, ServiceSet, WalletInfo};
pub use trader::{execute_strategy, stop_trading, StrategyOutcome};
