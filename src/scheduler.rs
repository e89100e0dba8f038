//! Cycle scheduler - the bot's start/stop state machine and timer

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::audit::AuditLog;
use crate::config::Settings;
use crate::cycle::run_cycle;
use crate::positions::PositionBook;
use crate::services::{initialize_services, InitError, OperatingMode, ServiceSet};
use crate::trader::stop_trading;

/// Result of a start request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { mode: OperatingMode },
    /// The bot was already starting or running; nothing was touched
    AlreadyRunning,
}

/// Result of a stop request; stopping is infallible
#[derive(Debug, Clone)]
pub struct StopSummary {
    pub was_running: bool,
    /// Positions left in the book at shutdown
    pub open_positions: usize,
    pub message: String,
}

enum Phase {
    Stopped,
    Starting,
    Running,
}

struct TickerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Mutable bot state; one instance per process, only ever touched with
/// the state lock held. The ticker is present exactly when the phase is
/// Running.
struct BotState {
    phase: Phase,
    started_at: Option<DateTime<Utc>>,
    services: Option<Arc<ServiceSet>>,
    ticker: Option<TickerHandle>,
}

/// The orchestration core: owns the running/stopped state machine,
/// triggers cycles on a fixed interval and exposes idempotent
/// start/stop control
pub struct Bot {
    settings: Settings,
    positions: PositionBook,
    audit: AuditLog,
    state: Mutex<BotState>,
}

impl Bot {
    pub fn new(settings: Settings) -> Self {
        let positions = PositionBook::new(settings.paper_equity_usd);
        let audit = AuditLog::new(settings.audit_dir.clone());
        Self {
            settings,
            positions,
            audit,
            state: Mutex::new(BotState {
                phase: Phase::Stopped,
                started_at: None,
                services: None,
                ticker: None,
            }),
        }
    }

    /// The process-wide position registry
    pub fn positions(&self) -> &PositionBook {
        &self.positions
    }

    pub async fn is_running(&self) -> bool {
        matches!(self.state.lock().await.phase, Phase::Running)
    }

    pub async fn started_at(&self) -> Option<DateTime<Utc>> {
        self.state.lock().await.started_at
    }

    /// Start the bot: initialize services, run one cycle inline, then arm
    /// the repeating timer
    ///
    /// Idempotent: a second start while starting or running returns
    /// `AlreadyRunning` without re-initializing anything. The state lock
    /// is held for the whole transition, so start and stop can never
    /// interleave.
    pub async fn start(&self) -> Result<StartOutcome, InitError> {
        let mut state = self.state.lock().await;
        if !matches!(state.phase, Phase::Stopped) {
            debug!("Start requested but the bot is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }
        state.phase = Phase::Starting;
        info!("Starting bot...");

        let services = match initialize_services(&self.settings).await {
            Ok(services) => Arc::new(services),
            Err(e) => {
                error!("Initialization failed: {}", e);
                state.phase = Phase::Stopped;
                return Err(e);
            }
        };

        if let Err(e) = self.audit.init().await {
            warn!(
                "Audit log unavailable at {:?} (continuing): {:#}",
                self.settings.audit_dir, e
            );
        }

        // First cycle runs inline so the caller observes a full pass
        // before start() returns; its failure is already contained
        run_cycle(&services, &self.settings, &self.positions, &self.audit).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(cycle_loop(
            services.clone(),
            self.settings.clone(),
            self.positions.clone(),
            self.audit.clone(),
            shutdown_rx,
        ));

        let mode = services.mode;
        state.services = Some(services);
        state.started_at = Some(Utc::now());
        state.ticker = Some(TickerHandle {
            shutdown: shutdown_tx,
            task,
        });
        state.phase = Phase::Running;

        info!(
            "✓ Bot running | mode: {} | cycle every {}s",
            mode,
            self.settings.analysis_interval.as_secs()
        );
        Ok(StartOutcome::Started { mode })
    }

    /// Stop the bot: disarm the timer, halt trading, report remaining
    /// exposure
    ///
    /// Unconditional: every failure on the way down is logged and
    /// swallowed. A stop while already stopped is a no-op. An in-flight
    /// cycle is not aborted, but no new cycle can fire once this returns.
    pub async fn stop(&self) -> StopSummary {
        let mut state = self.state.lock().await;
        if matches!(state.phase, Phase::Stopped) {
            debug!("Stop requested but the bot is not running");
            return StopSummary {
                was_running: false,
                open_positions: 0,
                message: "not running".to_string(),
            };
        }

        info!("Stopping bot...");

        // Disarm first; once the loop task joins, no further firing exists
        if let Some(ticker) = state.ticker.take() {
            let _ = ticker.shutdown.send(true);
            if let Err(e) = ticker.task.await {
                warn!("Cycle loop ended abnormally: {}", e);
            }
        }

        match stop_trading(&self.positions, &self.audit).await {
            Ok(report) => info!("{}", report.message),
            Err(e) => error!("Trade halt failed (ignored, shutdown continues): {:#}", e),
        }

        let open_positions = self.positions.len();
        if open_positions > 0 {
            warn!(
                "{} open position(s) require manual management",
                open_positions
            );
        }

        state.services = None;
        state.started_at = None;
        state.phase = Phase::Stopped;

        info!("✓ Bot stopped");
        StopSummary {
            was_running: true,
            open_positions,
            message: "bot stopped".to_string(),
        }
    }
}

/// Repeating timer: every firing spawns one cycle task until the
/// shutdown signal arrives
async fn cycle_loop(
    services: Arc<ServiceSet>,
    settings: Settings,
    positions: PositionBook,
    audit: AuditLog,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(settings.analysis_interval);
    // interval fires immediately; the boot cycle already covered that slot
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let services = services.clone();
                let settings = settings.clone();
                let positions = positions.clone();
                let audit = audit.clone();
                // Overlap allowed: a slow cycle must never delay or skip
                // the next firing
                tokio::spawn(async move {
                    run_cycle(&services, &settings, &positions, &audit).await;
                });
            }
            _ = shutdown.changed() => break,
        }
    }

    debug!("Cycle timer disarmed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::time::Duration;

    fn offline_settings() -> Settings {
        Settings {
            network: crate::config::Network::Devnet,
            rpc_url: "http://127.0.0.1:1".to_string(),
            market_data_url: "http://127.0.0.1:1".to_string(),
            wallet_address: None,
            analysis_interval: Duration::from_secs(60),
            trading_enabled: false,
            min_score: 5.0,
            max_positions: 3,
            trade_amount_usd: Decimal::from(100),
            paper_equity_usd: Decimal::from(10_000),
            min_balance_sol: Decimal::new(5, 2),
            stop_loss_pct: Decimal::from(10),
            take_profit_pct: Decimal::from(25),
            watchlist: vec![],
            audit_dir: std::env::temp_dir().join("trade-runner-test-audit"),
        }
    }

    #[tokio::test]
    async fn test_new_bot_is_stopped() {
        let bot = Bot::new(offline_settings());
        assert!(!bot.is_running().await);
        assert!(bot.started_at().await.is_none());
        assert!(bot.positions().is_empty());
    }

    #[tokio::test]
    async fn test_stop_while_stopped_is_noop() {
        let bot = Bot::new(offline_settings());

        let summary = bot.stop().await;
        assert!(!summary.was_running);
        assert_eq!(summary.message, "not running");

        // Still stoppable again, still stopped
        let summary = bot.stop().await;
        assert!(!summary.was_running);
        assert!(!bot.is_running().await);
    }

    #[tokio::test]
    async fn test_start_without_wallet_fails_and_stays_stopped() {
        // Unreachable RPC and no wallet address: initialization must fail
        // and leave the state machine in Stopped
        let bot = Bot::new(offline_settings());

        let result = bot.start().await;
        assert!(result.is_err());
        assert!(!bot.is_running().await);

        // A later stop is still a clean no-op
        let summary = bot.stop().await;
        assert!(!summary.was_running);
    }
}
