//! Market data client for the DEX pairs API

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

/// One trading pair as reported by the pairs API, flattened to what the
/// analyzer consumes
#[derive(Debug, Clone)]
pub struct PairSnapshot {
    pub symbol: String,
    pub price_usd: Decimal,
    pub change_1h: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub liquidity_usd: f64,
}

/// HTTP client for a DexScreener-compatible pairs endpoint
pub struct MarketDataClient {
    client: Client,
    base_url: String,
}

impl MarketDataClient {
    /// Create new market data client
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch pair snapshots for a set of token mints
    ///
    /// Pairs without a USD price are skipped; the same token can appear in
    /// several pairs and the caller decides which to keep.
    pub async fn token_pairs(&self, mints: &[String]) -> anyhow::Result<Vec<PairSnapshot>> {
        let url = format!(
            "{}/latest/dex/tokens/{}",
            self.base_url,
            mints.join(",")
        );

        debug!("Fetching pairs from {}", url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Pairs fetch failed: {} - {}", status, text));
        }

        let body: TokenPairsResponse = response.json().await?;
        let pairs = body.pairs.unwrap_or_default();

        let mut snapshots = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let Some(raw_price) = pair.price_usd else {
                debug!("Pair {} has no USD price, skipping", pair.base_token.symbol);
                continue;
            };
            let price_usd: Decimal = match raw_price.parse() {
                Ok(p) => p,
                Err(e) => {
                    debug!(
                        "Unparseable price {:?} for {}: {}",
                        raw_price, pair.base_token.symbol, e
                    );
                    continue;
                }
            };

            let change = pair.price_change.unwrap_or_default();
            snapshots.push(PairSnapshot {
                symbol: pair.base_token.symbol,
                price_usd,
                change_1h: change.h1.unwrap_or(0.0),
                change_24h: change.h24.unwrap_or(0.0),
                volume_24h: pair.volume.and_then(|v| v.h24).unwrap_or(0.0),
                liquidity_usd: pair.liquidity.and_then(|l| l.usd).unwrap_or(0.0),
            });
        }

        Ok(snapshots)
    }
}

// Response types for the pairs API

#[derive(Debug, Deserialize)]
struct TokenPairsResponse {
    pairs: Option<Vec<PairData>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PairData {
    base_token: BaseToken,
    price_usd: Option<String>,
    price_change: Option<PriceChange>,
    volume: Option<VolumeWindows>,
    liquidity: Option<LiquidityInfo>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    symbol: String,
}

#[derive(Debug, Default, Deserialize)]
struct PriceChange {
    h1: Option<f64>,
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct VolumeWindows {
    h24: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LiquidityInfo {
    usd: Option<f64>,
}
