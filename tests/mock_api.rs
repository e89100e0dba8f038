//! Wiremock stand-ins for the RPC node and the pairs API, shared by the
//! scenario suites

#![allow(dead_code)]

use std::path::Path;
use std::time::Duration;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use trade_runner::Settings;

pub const WALLET: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Mount a healthy node: getHealth ok plus a wallet balance in lamports
pub async fn mount_rpc(server: &MockServer, lamports: u64) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getHealth" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": "ok",
            "id": 1
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "getBalance" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": { "context": { "slot": 1 }, "value": lamports },
            "id": 1
        })))
        .mount(server)
        .await;
}

/// One entry for the pairs payload
pub fn pair(symbol: &str, price: &str, h1: f64, h24: f64, volume: f64, liquidity: f64) -> Value {
    json!({
        "baseToken": { "symbol": symbol, "address": SOL_MINT },
        "priceUsd": price,
        "priceChange": { "h1": h1, "h24": h24 },
        "volume": { "h24": volume },
        "liquidity": { "usd": liquidity }
    })
}

/// A pair that scores well above the default threshold
pub fn pumping_pair(symbol: &str, price: &str) -> Value {
    pair(symbol, price, 15.0, 40.0, 5_000_000.0, 500_000.0)
}

/// A pair that scores well below the default threshold
pub fn dumping_pair(symbol: &str, price: &str) -> Value {
    pair(symbol, price, -8.0, -30.0, 10_000.0, 10_000.0)
}

pub async fn mount_pairs(server: &MockServer, pairs: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/latest/dex/tokens/.*$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "schemaVersion": "1.0.0",
            "pairs": pairs
        })))
        .mount(server)
        .await;
}

pub async fn mount_pairs_failure(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/latest/dex/tokens/.*$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

/// Settings wired to the mock server, with a fast cycle interval
pub fn test_settings(server_uri: &str, audit_dir: &Path) -> Settings {
    Settings {
        network: trade_runner::Network::Devnet,
        rpc_url: server_uri.to_string(),
        market_data_url: server_uri.to_string(),
        wallet_address: Some(WALLET.to_string()),
        analysis_interval: Duration::from_millis(150),
        trading_enabled: false,
        min_score: 5.0,
        max_positions: 3,
        trade_amount_usd: Decimal::from(100),
        paper_equity_usd: Decimal::from(10_000),
        min_balance_sol: Decimal::new(5, 2),
        stop_loss_pct: Decimal::from(10),
        take_profit_pct: Decimal::from(25),
        watchlist: vec![SOL_MINT.to_string()],
        audit_dir: audit_dir.to_path_buf(),
    }
}

/// How many market-data requests the server has seen
pub async fn market_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path().starts_with("/latest/dex/tokens"))
        .count()
}

/// How many balance reads the server has seen
pub async fn balance_request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| {
            std::str::from_utf8(&r.body)
                .map(|body| body.contains("getBalance"))
                .unwrap_or(false)
        })
        .count()
}

#[tokio::test]
async fn test_mock_rpc_serves_health_and_balance() {
    let server = MockServer::start().await;
    mount_rpc(&server, 2_000_000_000).await;

    let rpc = trade_runner::RpcConnection::new(&server.uri()).unwrap();
    rpc.get_health().await.unwrap();

    let balance = rpc.get_balance(WALLET).await.unwrap();
    assert_eq!(balance, Decimal::from(2));
    assert_eq!(balance_request_count(&server).await, 1);
}
