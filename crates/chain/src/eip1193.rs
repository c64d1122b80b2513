//! Wallet provider speaking EIP-1193 methods over JSON-RPC.
//!
//! Desktop wallets and wallet bridges expose the same request surface that
//! browser extensions inject (`eth_accounts`, `wallet_switchEthereumChain`,
//! `eth_sendTransaction`, ...) on a local HTTP endpoint. Signing happens in
//! the wallet; this client only forwards requests.

use crate::rpc::{encode_bytes, parse_quantity, JsonRpcClient};
use crate::{
    erc20, AddChainParams, ProviderError, TokenContract, TokenReader, TxReceipt, WalletProvider,
    UNRECOGNIZED_CHAIN_CODE,
};
use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::time::{sleep, Duration};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SwitchChainParams {
    chain_id: String,
}

#[derive(Debug, Serialize)]
struct SendTransactionParams {
    from: Address,
    to: Address,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: B256,
    block_number: Option<String>,
    status: Option<String>,
}

impl RpcReceipt {
    fn into_receipt(self) -> Result<TxReceipt, ProviderError> {
        let block_number = self.block_number.as_deref().map(parse_quantity).transpose()?;
        // Receipts without a status field predate EIP-658; treat them as included.
        let success = self.status.as_deref().map_or(true, |s| s == "0x1");
        Ok(TxReceipt {
            tx_hash: self.transaction_hash,
            block_number,
            success,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Eip1193Wallet {
    rpc: Arc<JsonRpcClient>,
    poll_interval: Duration,
}

impl Eip1193Wallet {
    pub fn new(endpoint: impl Into<String>) -> Result<Arc<Self>, ProviderError> {
        Self::with_poll_interval(endpoint, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(
        endpoint: impl Into<String>,
        poll_interval: Duration,
    ) -> Result<Arc<Self>, ProviderError> {
        let rpc = JsonRpcClient::new(endpoint)?;
        Ok(Arc::new(Self {
            rpc: Arc::new(rpc),
            poll_interval,
        }))
    }
}

#[async_trait]
impl WalletProvider for Eip1193Wallet {
    async fn account(&self) -> Result<Option<Address>, ProviderError> {
        let accounts: Vec<Address> = self.rpc.request("eth_accounts", serde_json::json!([])).await?;
        Ok(accounts.into_iter().next())
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let id: String = self.rpc.request("eth_chainId", serde_json::json!([])).await?;
        parse_quantity(&id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError> {
        let params = [SwitchChainParams {
            chain_id: format!("0x{chain_id:x}"),
        }];
        match self
            .rpc
            .request::<_, serde_json::Value>("wallet_switchEthereumChain", params)
            .await
        {
            Ok(_) => Ok(()),
            Err(ProviderError::Rpc { code, .. }) if code == UNRECOGNIZED_CHAIN_CODE => {
                Err(ProviderError::UnrecognizedChain(chain_id))
            }
            Err(e) => Err(e),
        }
    }

    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError> {
        self.rpc
            .request::<_, serde_json::Value>("wallet_addEthereumChain", [params])
            .await?;
        tracing::info!(chain_id = %params.chain_id, chain_name = %params.chain_name, "wallet added chain");
        Ok(())
    }

    fn token(&self, address: Address, signer: Address) -> Arc<dyn TokenContract> {
        Arc::new(Eip1193Token {
            rpc: Arc::clone(&self.rpc),
            address,
            signer,
        })
    }

    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError> {
        loop {
            let receipt: Option<RpcReceipt> = self
                .rpc
                .request("eth_getTransactionReceipt", [tx_hash])
                .await?;
            if let Some(r) = receipt {
                return r.into_receipt();
            }
            tracing::debug!(%tx_hash, "receipt not available yet");
            sleep(self.poll_interval).await;
        }
    }
}

/// ERC-20 contract handle whose transfers the wallet signs as `signer`.
pub struct Eip1193Token {
    rpc: Arc<JsonRpcClient>,
    address: Address,
    signer: Address,
}

#[async_trait]
impl TokenContract for Eip1193Token {
    fn address(&self) -> Address {
        self.address
    }

    async fn decimals(&self) -> Result<u8, ProviderError> {
        TokenReader::decimals(self.rpc.as_ref(), self.address).await
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError> {
        TokenReader::balance_of(self.rpc.as_ref(), self.address, owner).await
    }

    async fn transfer(&self, to: Address, amount: U256) -> Result<B256, ProviderError> {
        let tx = SendTransactionParams {
            from: self.signer,
            to: self.address,
            data: encode_bytes(&erc20::transfer_calldata(to, amount)),
        };
        let hash: B256 = self.rpc.request("eth_sendTransaction", [tx]).await?;
        tracing::info!(tx_hash = %hash, token = %self.address, %to, %amount, "transfer submitted");
        Ok(hash)
    }
}
