//! Minimal Solana JSON-RPC connection

use std::time::Duration;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// JSON-RPC connection to a Solana node
///
/// Only the two calls the orchestrator needs: a health probe at boot and
/// wallet balance reads.
pub struct RpcConnection {
    client: Client,
    url: String,
}

impl RpcConnection {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe node health; an unhealthy or unreachable node is an error
    pub async fn get_health(&self) -> anyhow::Result<()> {
        let result: String = self.call("getHealth", json!([])).await?;
        if result == "ok" {
            Ok(())
        } else {
            Err(anyhow::anyhow!("node reported unhealthy: {}", result))
        }
    }

    /// Wallet balance in SOL
    pub async fn get_balance(&self, address: &str) -> anyhow::Result<Decimal> {
        let result: BalanceResult = self.call("getBalance", json!([address])).await?;
        Ok(Decimal::from(result.value) / Decimal::from(LAMPORTS_PER_SOL))
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        rpc_method: &str,
        params: serde_json::Value,
    ) -> anyhow::Result<T> {
        debug!("RPC {} -> {}", rpc_method, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": rpc_method,
                "params": params,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("RPC {} failed: {} - {}", rpc_method, status, text));
        }

        let body: RpcResponse<T> = response.json().await?;

        if let Some(err) = body.error {
            return Err(anyhow::anyhow!(
                "RPC {} error {}: {}",
                rpc_method,
                err.code,
                err.message
            ));
        }

        body.result
            .ok_or_else(|| anyhow::anyhow!("RPC {} returned no result", rpc_method))
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}
