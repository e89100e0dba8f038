//! Audit log - structured trade and analysis records as JSONL

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const TRADES_FILE: &str = "trades.jsonl";
const ANALYSIS_FILE: &str = "analysis.jsonl";

/// One executed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    /// "buy" or "sell"
    pub side: String,
    pub price_usd: Decimal,
    pub amount: Decimal,
    pub value_usd: Decimal,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pnl_usd: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Outcome of one analysis pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub timestamp: DateTime<Utc>,
    pub mode: String,
    pub duration_ms: u64,
    pub tokens_analyzed: usize,
    pub top: Vec<TokenScoreEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenScoreEntry {
    pub symbol: String,
    pub score: f64,
}

/// Appends audit records under a log directory, one JSON object per line
#[derive(Debug, Clone)]
pub struct AuditLog {
    dir: PathBuf,
}

impl AuditLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn record_trade(&self, record: &TradeRecord) -> anyhow::Result<()> {
        self.append(TRADES_FILE, serde_json::to_string(record)?).await
    }

    pub async fn record_analysis(&self, record: &AnalysisRecord) -> anyhow::Result<()> {
        self.append(ANALYSIS_FILE, serde_json::to_string(record)?).await
    }

    async fn append(&self, file: &str, line: String) -> anyhow::Result<()> {
        let path = self.dir.join(file);
        let mut handle = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        handle.write_all(line.as_bytes()).await?;
        handle.write_all(b"\n").await?;
        debug!("Appended audit record to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trade_records_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLog::new(dir.path());
        audit.init().await.unwrap();

        for symbol in ["SOL", "BONK"] {
            audit
                .record_trade(&TradeRecord {
                    timestamp: Utc::now(),
                    symbol: symbol.to_string(),
                    side: "buy".to_string(),
                    price_usd: Decimal::from(150),
                    amount: Decimal::from(2),
                    value_usd: Decimal::from(300),
                    mode: "trading".to_string(),
                    pnl_usd: None,
                    note: None,
                })
                .await
                .unwrap();
        }

        let raw = std::fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        let records: Vec<TradeRecord> = raw
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].symbol, "SOL");
        assert_eq!(records[1].symbol, "BONK");
        assert!(!raw.contains("pnl_usd"));
    }

    #[tokio::test]
    async fn test_analysis_record_written() {
        let dir = tempfile::tempdir().unwrap();
        let audit = AuditLog::new(dir.path());
        audit.init().await.unwrap();

        audit
            .record_analysis(&AnalysisRecord {
                timestamp: Utc::now(),
                mode: "monitoring".to_string(),
                duration_ms: 420,
                tokens_analyzed: 4,
                top: vec![TokenScoreEntry {
                    symbol: "SOL".to_string(),
                    score: 7.5,
                }],
            })
            .await
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join(ANALYSIS_FILE)).unwrap();
        let record: AnalysisRecord = serde_json::from_str(raw.trim()).unwrap();
        assert_eq!(record.tokens_analyzed, 4);
        assert_eq!(record.top[0].symbol, "SOL");
    }
}
