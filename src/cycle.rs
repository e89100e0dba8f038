//! Cycle executor - one analysis-then-trade pass

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::analyzer::{perform_analysis, ScoredToken};
use crate::audit::{AnalysisRecord, AuditLog, TokenScoreEntry};
use crate::config::Settings;
use crate::positions::PositionBook;
use crate::services::{OperatingMode, ServiceSet};
use crate::trader::{execute_strategy, StrategyOutcome};

/// How many shortlist entries a monitoring cycle reports
const SHORTLIST_LIMIT: usize = 5;

/// Everything one completed cycle produced
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub tokens_analyzed: Vec<ScoredToken>,
    /// Monitoring mode only: tokens above the score threshold, top 5
    pub opportunities: Vec<ScoredToken>,
    /// Trading mode only: the strategy pass result
    pub trade: Option<StrategyOutcome>,
    pub duration_ms: u64,
}

/// Outcome of one cycle; failures are values, never panics or errors
/// crossing this boundary
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    Completed(CycleReport),
    Failed { reason: String },
}

impl CycleOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CycleOutcome::Completed(_))
    }

    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Completed(report) => Some(report),
            CycleOutcome::Failed { .. } => None,
        }
    }
}

/// Run exactly one cycle against an initialized service set
///
/// A failing collaborator produces `CycleOutcome::Failed`; the caller's
/// timer must never be affected by anything that happens in here.
pub async fn run_cycle(
    services: &ServiceSet,
    settings: &Settings,
    book: &PositionBook,
    audit: &AuditLog,
) -> CycleOutcome {
    let started = Instant::now();
    debug!("Cycle starting");

    let tokens = match perform_analysis(&services.market, settings).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            return CycleOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    let duration_ms = started.elapsed().as_millis() as u64;

    let mut report = CycleReport {
        tokens_analyzed: tokens,
        opportunities: Vec::new(),
        trade: None,
        duration_ms,
    };

    if services.mode == OperatingMode::Trading && settings.trading_enabled {
        let outcome =
            execute_strategy(&report.tokens_analyzed, services, settings, book, audit).await;
        if outcome.success {
            if outcome.positions_opened > 0 {
                info!(
                    "Strategy pass opened {} / closed {} position(s)",
                    outcome.positions_opened, outcome.positions_closed
                );
            }
        } else {
            warn!(
                "Strategy pass failed: {}",
                outcome.reason.as_deref().unwrap_or("unknown")
            );
        }
        report.trade = Some(outcome);
    } else {
        report.opportunities = shortlist(&report.tokens_analyzed, settings.min_score);
        if report.opportunities.is_empty() {
            debug!("No tokens above the {} score threshold", settings.min_score);
        } else {
            let listing = report
                .opportunities
                .iter()
                .map(|t| format!("{} ({:.2})", t.symbol, t.score))
                .collect::<Vec<_>>()
                .join(", ");
            info!("Potential opportunities: {}", listing);
        }
    }

    let record = AnalysisRecord {
        timestamp: Utc::now(),
        mode: services.mode.to_string(),
        duration_ms: report.duration_ms,
        tokens_analyzed: report.tokens_analyzed.len(),
        top: report
            .tokens_analyzed
            .iter()
            .take(SHORTLIST_LIMIT)
            .map(|t| TokenScoreEntry {
                symbol: t.symbol.clone(),
                score: t.score,
            })
            .collect(),
    };
    if let Err(e) = audit.record_analysis(&record).await {
        debug!("Audit write failed (ignored): {:#}", e);
    }

    info!(
        "Cycle finished in {}ms | {} token(s) analyzed",
        report.duration_ms,
        report.tokens_analyzed.len()
    );

    CycleOutcome::Completed(report)
}

/// Tokens above the score threshold, truncated to the shortlist limit
///
/// Input is already sorted descending, so the shortlist keeps the best.
fn shortlist(tokens: &[ScoredToken], min_score: f64) -> Vec<ScoredToken> {
    tokens
        .iter()
        .filter(|t| t.score > min_score)
        .take(SHORTLIST_LIMIT)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn token(symbol: &str, score: f64) -> ScoredToken {
        ScoredToken {
            symbol: symbol.to_string(),
            score,
            price_usd: Decimal::ONE,
            price_change_1h: 0.0,
            price_change_24h: 0.0,
        }
    }

    #[test]
    fn test_shortlist_keeps_tokens_above_threshold() {
        let tokens = vec![token("A", 9.1), token("B", 7.0), token("C", 2.0)];

        let picked = shortlist(&tokens, 5.0);

        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].symbol, "A");
        assert_eq!(picked[1].symbol, "B");
    }

    #[test]
    fn test_shortlist_truncates_to_five() {
        let tokens: Vec<ScoredToken> = (0..8)
            .map(|i| token(&format!("T{}", i), 9.0 - i as f64 * 0.1))
            .collect();

        let picked = shortlist(&tokens, 5.0);
        assert_eq!(picked.len(), 5);
        assert_eq!(picked[0].symbol, "T0");
        assert_eq!(picked[4].symbol, "T4");
    }

    #[test]
    fn test_shortlist_threshold_is_exclusive() {
        let tokens = vec![token("EDGE", 5.0)];
        assert!(shortlist(&tokens, 5.0).is_empty());
    }
}
