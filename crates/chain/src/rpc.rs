use crate::{erc20, ProviderError, TokenReader};
use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: serde_json::Value,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 over HTTP. Used both for public Celo nodes and for wallets
/// that expose EIP-1193 methods on a local endpoint.
#[derive(Debug)]
pub struct JsonRpcClient {
    url: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .tcp_keepalive(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            url: url.into(),
            http_client,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn request<P, R>(&self, method: &str, params: P) -> Result<R, ProviderError>
    where
        P: Serialize + Send,
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let resp = self.http_client.post(&self.url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!(
                "{method} failed: {status} - {text}"
            )));
        }

        let rpc_resp: RpcResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Decode(format!("{method}: {e}")))?;

        if let Some(err) = rpc_resp.error {
            tracing::debug!(%method, code = err.code, message = %err.message, "rpc error");
            return Err(ProviderError::from_rpc(err.code, err.message));
        }

        serde_json::from_value(rpc_resp.result)
            .map_err(|e| ProviderError::Decode(format!("{method}: {e}")))
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Vec<u8>) -> Result<Vec<u8>, ProviderError> {
        let params = serde_json::json!([
            { "to": to, "data": encode_bytes(&data) },
            "latest"
        ]);
        let out: String = self.request("eth_call", params).await?;
        decode_bytes(&out)
    }
}

#[async_trait]
impl TokenReader for JsonRpcClient {
    async fn decimals(&self, token: Address) -> Result<u8, ProviderError> {
        let out = self.call(token, erc20::decimals_calldata()).await?;
        erc20::decode_decimals(&out)
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ProviderError> {
        let out = self.call(token, erc20::balance_of_calldata(owner)).await?;
        erc20::decode_balance(&out)
    }
}

pub fn encode_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

pub fn decode_bytes(s: &str) -> Result<Vec<u8>, ProviderError> {
    hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| ProviderError::Decode(format!("bad hex data: {e}")))
}

/// Parse a `0x`-prefixed hex quantity such as a chain id or block number.
pub fn parse_quantity(s: &str) -> Result<u64, ProviderError> {
    let digits = s.trim_start_matches("0x");
    u64::from_str_radix(digits, 16).map_err(|e| ProviderError::Decode(format!("bad quantity {s:?}: {e}")))
}
