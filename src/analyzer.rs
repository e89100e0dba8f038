//! Token analysis - scores watchlist tokens from market data

use std::cmp::Ordering;
use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::Settings;
use crate::market::{MarketDataClient, PairSnapshot};

// Factor weights; momentum dominates, depth keeps illiquid pairs down
const WEIGHT_MOMENTUM_1H: f64 = 0.35;
const WEIGHT_MOMENTUM_24H: f64 = 0.25;
const WEIGHT_VOLUME: f64 = 0.25;
const WEIGHT_LIQUIDITY: f64 = 0.15;

/// A token with its computed score, sorted descending in analysis output
#[derive(Debug, Clone, Serialize)]
pub struct ScoredToken {
    pub symbol: String,
    pub score: f64,
    pub price_usd: Decimal,
    pub price_change_1h: f64,
    pub price_change_24h: f64,
}

/// Fetch market data for the watchlist and return scored tokens,
/// best first
///
/// A token traded in several pairs keeps only its deepest-liquidity pair.
/// The result may be empty.
pub async fn perform_analysis(
    market: &MarketDataClient,
    settings: &Settings,
) -> anyhow::Result<Vec<ScoredToken>> {
    if settings.watchlist.is_empty() {
        debug!("Watchlist is empty, nothing to analyze");
        return Ok(Vec::new());
    }

    let pairs = market.token_pairs(&settings.watchlist).await?;

    let mut best: HashMap<String, PairSnapshot> = HashMap::new();
    for pair in pairs {
        let keep = best
            .get(&pair.symbol)
            .map_or(true, |held| pair.liquidity_usd > held.liquidity_usd);
        if keep {
            best.insert(pair.symbol.clone(), pair);
        }
    }

    let mut tokens: Vec<ScoredToken> = best.into_values().map(score_token).collect();
    tokens.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    debug!("Analyzed {} token(s)", tokens.len());
    Ok(tokens)
}

/// Score a pair snapshot on a 0-10 scale
pub fn score_token(snapshot: PairSnapshot) -> ScoredToken {
    // Momentum: +/-10% in an hour or +/-20% on the day saturates the factor
    let momentum_1h = normalize((snapshot.change_1h / 10.0).clamp(-1.0, 1.0));
    let momentum_24h = normalize((snapshot.change_24h / 20.0).clamp(-1.0, 1.0));

    // Depth factors are log-scaled; $10M daily volume / $1M liquidity saturate
    let volume = (log10_or_zero(snapshot.volume_24h) / 7.0).clamp(0.0, 1.0);
    let liquidity = (log10_or_zero(snapshot.liquidity_usd) / 6.0).clamp(0.0, 1.0);

    let score = 10.0
        * (WEIGHT_MOMENTUM_1H * momentum_1h
            + WEIGHT_MOMENTUM_24H * momentum_24h
            + WEIGHT_VOLUME * volume
            + WEIGHT_LIQUIDITY * liquidity);

    ScoredToken {
        symbol: snapshot.symbol,
        score,
        price_usd: snapshot.price_usd,
        price_change_1h: snapshot.change_1h,
        price_change_24h: snapshot.change_24h,
    }
}

/// Map [-1, 1] to [0, 1]
fn normalize(v: f64) -> f64 {
    (v + 1.0) / 2.0
}

fn log10_or_zero(v: f64) -> f64 {
    if v > 1.0 {
        v.log10()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(symbol: &str, h1: f64, h24: f64, volume: f64, liquidity: f64) -> PairSnapshot {
        PairSnapshot {
            symbol: symbol.to_string(),
            price_usd: Decimal::new(15000, 2),
            change_1h: h1,
            change_24h: h24,
            volume_24h: volume,
            liquidity_usd: liquidity,
        }
    }

    #[test]
    fn test_score_bounds() {
        let best = score_token(snapshot("UP", 50.0, 100.0, 1e9, 1e8));
        let worst = score_token(snapshot("DOWN", -50.0, -100.0, 0.0, 0.0));

        assert!(best.score <= 10.0);
        assert!(best.score > 9.0);
        assert!(worst.score >= 0.0);
        assert!(worst.score < 1.0);
    }

    #[test]
    fn test_pumping_token_outscores_dumping_token() {
        let pumping = score_token(snapshot("PUMP", 15.0, 40.0, 5_000_000.0, 500_000.0));
        let dumping = score_token(snapshot("DUMP", -8.0, -30.0, 10_000.0, 10_000.0));

        assert!(pumping.score > 5.0, "pumping score was {}", pumping.score);
        assert!(dumping.score < 5.0, "dumping score was {}", dumping.score);
    }

    #[test]
    fn test_deeper_liquidity_scores_higher() {
        let deep = score_token(snapshot("A", 2.0, 5.0, 1_000_000.0, 900_000.0));
        let shallow = score_token(snapshot("A", 2.0, 5.0, 1_000_000.0, 2_000.0));

        assert!(deep.score > shallow.score);
    }
}
