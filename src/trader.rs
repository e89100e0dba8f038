//! Strategy execution - paper fills against the position book

use rand::Rng;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::analyzer::ScoredToken;
use crate::audit::{AuditLog, TradeRecord};
use crate::config::Settings;
use crate::positions::{BookError, Position, PositionBook};
use crate::services::ServiceSet;

/// Result of one strategy pass; never an error across this boundary
#[derive(Debug, Clone)]
pub struct StrategyOutcome {
    pub success: bool,
    pub positions_opened: usize,
    pub positions_closed: usize,
    /// Newly opened positions
    pub positions: Vec<Position>,
    pub reason: Option<String>,
}

/// Shutdown report from the trade halt
#[derive(Debug, Clone)]
pub struct StopReport {
    pub message: String,
    pub open_positions: usize,
}

/// Run one strategy pass over the scored tokens: close positions that hit
/// their exit bands, then open entries for qualifying tokens
///
/// All failures are folded into the outcome; this function never panics
/// or returns an error to the cycle.
pub async fn execute_strategy(
    tokens: &[ScoredToken],
    services: &ServiceSet,
    settings: &Settings,
    book: &PositionBook,
    audit: &AuditLog,
) -> StrategyOutcome {
    let mode = services.mode.to_string();
    let positions_closed = run_exit_pass(tokens, settings, book, audit, &mode).await;

    let mut opened = Vec::new();
    let mut reason: Option<String> = None;

    for token in tokens {
        if token.score < settings.min_score {
            // Tokens are sorted by descending score
            break;
        }
        if book.holds(&token.symbol) {
            debug!("Already holding {}, skipping", token.symbol);
            continue;
        }
        if book.len() >= settings.max_positions {
            debug!(
                "Position cap ({}) reached, skipping remaining candidates",
                settings.max_positions
            );
            break;
        }

        let entry_price = with_slippage(token.price_usd, Side::Buy);
        match book.open(&token.symbol, entry_price, settings.trade_amount_usd) {
            Ok(position) => {
                let record = TradeRecord {
                    timestamp: position.opened_at,
                    symbol: position.symbol.clone(),
                    side: "buy".to_string(),
                    price_usd: position.entry_price,
                    amount: position.amount,
                    value_usd: position.cost_usd,
                    mode: mode.clone(),
                    pnl_usd: None,
                    note: Some(format!("score {:.2}", token.score)),
                };
                if let Err(e) = audit.record_trade(&record).await {
                    debug!("Audit write failed (ignored): {:#}", e);
                }
                opened.push(position);
            }
            Err(BookError::InsufficientFunds { needed, available }) => {
                warn!(
                    "Cannot fund entry for {}: need {} USD, have {} USD",
                    token.symbol, needed, available
                );
                reason = Some("insufficient_funds".to_string());
                break;
            }
            Err(BookError::AlreadyHeld(symbol)) => {
                // Lost the race against an overlapping cycle
                debug!("{} was opened by a concurrent cycle", symbol);
            }
        }
    }

    if !opened.is_empty() {
        info!(
            "Opened {} position(s): {}",
            opened.len(),
            opened
                .iter()
                .map(|p| p.symbol.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    StrategyOutcome {
        success: reason.is_none(),
        positions_opened: opened.len(),
        positions_closed,
        positions: opened,
        reason,
    }
}

/// Close held positions whose unrealized pnl breached the configured
/// stop-loss or take-profit band; returns how many were closed
async fn run_exit_pass(
    tokens: &[ScoredToken],
    settings: &Settings,
    book: &PositionBook,
    audit: &AuditLog,
    mode: &str,
) -> usize {
    let mut closed_count = 0;

    for position in book.list() {
        let Some(token) = tokens.iter().find(|t| t.symbol == position.symbol) else {
            debug!("No quote for held position {}, keeping", position.symbol);
            continue;
        };

        let pnl_pct =
            (token.price_usd - position.entry_price) / position.entry_price * Decimal::from(100);

        let breach = if pnl_pct <= -settings.stop_loss_pct {
            Some("stop_loss")
        } else if pnl_pct >= settings.take_profit_pct {
            Some("take_profit")
        } else {
            None
        };

        let Some(trigger) = breach else { continue };

        let exit_price = with_slippage(token.price_usd, Side::Sell);
        if let Some(closed) = book.close(&position.symbol, exit_price) {
            info!(
                "{} triggered for {} at {} ({}% move)",
                trigger,
                closed.position.symbol,
                exit_price,
                pnl_pct.round_dp(2)
            );
            let record = TradeRecord {
                timestamp: chrono::Utc::now(),
                symbol: closed.position.symbol.clone(),
                side: "sell".to_string(),
                price_usd: exit_price,
                amount: closed.position.amount,
                value_usd: closed.proceeds_usd,
                mode: mode.to_string(),
                pnl_usd: Some(closed.pnl_usd),
                note: Some(trigger.to_string()),
            };
            if let Err(e) = audit.record_trade(&record).await {
                debug!("Audit write failed (ignored): {:#}", e);
            }
            closed_count += 1;
        }
    }

    closed_count
}

/// Halt trading for shutdown and report remaining exposure
///
/// Writes a final session marker to the trade log; the caller treats any
/// error here as non-fatal.
pub async fn stop_trading(book: &PositionBook, audit: &AuditLog) -> anyhow::Result<StopReport> {
    let open = book.list();
    let message = if open.is_empty() {
        "Trading halted; no open positions".to_string()
    } else {
        format!(
            "Trading halted; {} open position(s) require manual management",
            open.len()
        )
    };

    audit
        .record_trade(&TradeRecord {
            timestamp: chrono::Utc::now(),
            symbol: "*".to_string(),
            side: "halt".to_string(),
            price_usd: Decimal::ZERO,
            amount: Decimal::ZERO,
            value_usd: Decimal::ZERO,
            mode: "shutdown".to_string(),
            pnl_usd: None,
            note: Some(message.clone()),
        })
        .await?;

    Ok(StopReport {
        message,
        open_positions: open.len(),
    })
}

enum Side {
    Buy,
    Sell,
}

/// Apply up to 30bps of simulated slippage, always against the trade
fn with_slippage(quote: Decimal, side: Side) -> Decimal {
    let bps: u32 = rand::thread_rng().gen_range(0..=30);
    let jitter = Decimal::from(bps) / Decimal::from(10_000);
    match side {
        Side::Buy => quote * (Decimal::ONE + jitter),
        Side::Sell => quote * (Decimal::ONE - jitter),
    }
}
