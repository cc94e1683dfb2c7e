use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use sd_connectors::{Connection, Connector};
use sd_types::{ChainId, WalletId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";

/// Minimal Ethereum JSON-RPC client over HTTP.
///
/// Reads `SWAPDECK_RPC_URL` from environment when no endpoint is given
/// (default: `http://localhost:8545`).
pub struct JsonRpcClient {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl Default for JsonRpcClient {
    fn default() -> Self {
        Self::new(None)
    }
}

impl JsonRpcClient {
    pub fn new(endpoint: Option<String>) -> Self {
        let endpoint = endpoint
            .or_else(|| std::env::var("SWAPDECK_RPC_URL").ok())
            .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("{method} transport"))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("{method} HTTP {status}: {text}");
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .with_context(|| format!("{method} parse"))?;
        body.into_result(method)
    }

    pub async fn chain_id(&self) -> Result<ChainId> {
        let raw: String = self.call("eth_chainId", serde_json::json!([])).await?;
        Ok(ChainId(parse_quantity(&raw)?))
    }

    /// Timestamp (seconds) of the latest block.
    pub async fn latest_block_timestamp(&self) -> Result<u64> {
        let block: BlockHeader = self
            .call(
                "eth_getBlockByNumber",
                serde_json::json!(["latest", false]),
            )
            .await?;
        parse_quantity(&block.timestamp)
    }
}

// ── JSON-RPC 2.0 envelope ─────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl<T> RpcResponse<T> {
    fn into_result(self, method: &str) -> Result<T> {
        if let Some(err) = self.error {
            bail!("{method} failed ({}): {}", err.code, err.message);
        }
        self.result
            .ok_or_else(|| anyhow!("{method} response carried neither result nor error"))
    }
}

#[derive(Debug, Deserialize)]
struct BlockHeader {
    timestamp: String,
}

/// Parse a hex-encoded JSON-RPC quantity such as `"0x1a"`.
pub fn parse_quantity(raw: &str) -> Result<u64> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| anyhow!("quantity '{raw}' is missing the 0x prefix"))?;
    if digits.is_empty() {
        bail!("quantity '{raw}' has no digits");
    }
    u64::from_str_radix(digits, 16).with_context(|| format!("invalid quantity '{raw}'"))
}

/// Source of the current block time, used for transaction deadlines.
#[async_trait(?Send)]
pub trait BlockTimeOracle {
    async fn block_timestamp(&self) -> Result<u64>;
}

#[async_trait(?Send)]
impl BlockTimeOracle for JsonRpcClient {
    async fn block_timestamp(&self) -> Result<u64> {
        self.latest_block_timestamp().await
    }
}

/// Block time, or `None` while the chain is unreachable.
pub async fn current_block_timestamp(oracle: &dyn BlockTimeOracle) -> Option<u64> {
    match oracle.block_timestamp().await {
        Ok(timestamp) => Some(timestamp),
        Err(err) => {
            debug!("block timestamp unavailable: {err:#}");
            None
        }
    }
}

/// Read-only connector backed by the public RPC endpoint.
pub struct NetworkConnector {
    client: JsonRpcClient,
}

impl NetworkConnector {
    pub fn new(client: JsonRpcClient) -> Self {
        Self { client }
    }

    async fn connection(&self) -> Result<Connection> {
        let chain_id = self.client.chain_id().await?;
        Ok(Connection {
            chain_id: Some(chain_id),
            accounts: Vec::new(),
        })
    }
}

#[async_trait(?Send)]
impl Connector for NetworkConnector {
    fn wallet(&self) -> WalletId {
        WalletId::Network
    }

    fn supports_eager(&self) -> bool {
        true
    }

    async fn connect_eagerly(&self) -> Result<Connection> {
        self.connection().await
    }

    async fn activate(&self) -> Result<Connection> {
        self.connection().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_quantity("0x1").unwrap(), 1);
        assert_eq!(parse_quantity("0xa4b1").unwrap(), 42161);
        assert_eq!(parse_quantity("0X0").unwrap(), 0);
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("42").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn request_envelope_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 7,
            method: "eth_chainId",
            params: serde_json::json!([]),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"jsonrpc": "2.0", "id": 7, "method": "eth_chainId", "params": []})
        );
    }

    #[test]
    fn error_object_becomes_an_error() {
        let body: RpcResponse<String> = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
        )
        .unwrap();
        let err = body.into_result("eth_chainId").unwrap_err();
        assert!(err.to_string().contains("method not found"));

        let body: RpcResponse<String> =
            serde_json::from_str(r#"{"jsonrpc":"2.0","id":1,"result":"0xa"}"#).unwrap();
        assert_eq!(body.into_result("eth_chainId").unwrap(), "0xa");
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = JsonRpcClient::new(Some("http://node.local:8545/".into()));
        assert_eq!(client.endpoint(), "http://node.local:8545");
    }

    struct Unreachable;

    #[async_trait(?Send)]
    impl BlockTimeOracle for Unreachable {
        async fn block_timestamp(&self) -> Result<u64> {
            bail!("connection refused")
        }
    }

    #[tokio::test]
    async fn unreachable_oracle_yields_none() {
        assert_eq!(current_block_timestamp(&Unreachable).await, None);
    }

    #[tokio::test]
    async fn network_connector_fails_without_a_node() {
        let connector = NetworkConnector::new(JsonRpcClient::new(Some("http://127.0.0.1:9".into())));
        assert_eq!(connector.wallet(), WalletId::Network);
        assert!(connector.connect_eagerly().await.is_err());
    }
}
