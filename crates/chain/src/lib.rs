use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use mentopay_core::registry::ChainInfo;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod balance;
pub mod eip1193;
pub mod erc20;
pub mod mock;
pub mod rpc;

/// EIP-1193 error code for a request the user declined.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-1193 error code for an account or method the user never authorised.
pub const UNAUTHORIZED_CODE: i64 = 4100;
/// Error code wallets return when asked to switch to a chain they do not know.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("no account connected")]
    NoAccount,
    #[error("request rejected by user")]
    UserRejected,
    #[error("chain {0} is not known to the wallet")]
    UnrecognizedChain(u64),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("transaction {0} reverted")]
    Reverted(B256),
}

impl ProviderError {
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        match code {
            USER_REJECTED_CODE => ProviderError::UserRejected,
            UNAUTHORIZED_CODE => ProviderError::NoAccount,
            _ => ProviderError::Rpc {
                code,
                message: message.into(),
            },
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(err.to_string())
    }
}

/// `wallet_addEthereumChain` parameters (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrencyParams,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrencyParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl AddChainParams {
    pub fn for_chain(chain: &ChainInfo, rpc_url: &str) -> Self {
        Self {
            chain_id: chain.chain_id_hex(),
            chain_name: chain.name.to_string(),
            native_currency: NativeCurrencyParams {
                name: chain.native_currency.name.to_string(),
                symbol: chain.native_currency.symbol.to_string(),
                decimals: chain.native_currency.decimals,
            },
            rpc_urls: vec![rpc_url.to_string()],
            block_explorer_urls: vec![chain.explorer_url.to_string()],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Connected wallet: chain management, signer-bound contracts and receipts.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// The account the wallet is connected with, if any.
    async fn account(&self) -> Result<Option<Address>, ProviderError>;
    async fn chain_id(&self) -> Result<u64, ProviderError>;
    /// Fails with [`ProviderError::UnrecognizedChain`] when the wallet has no
    /// entry for `chain_id`.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), ProviderError>;
    async fn add_chain(&self, params: &AddChainParams) -> Result<(), ProviderError>;
    /// ERC-20 handle at `address` whose transfers are signed by `signer`.
    fn token(&self, address: Address, signer: Address) -> Arc<dyn TokenContract>;
    /// Resolves once the transaction is included. Polls without a deadline.
    async fn wait_for_receipt(&self, tx_hash: B256) -> Result<TxReceipt, ProviderError>;
}

#[async_trait]
pub trait TokenContract: Send + Sync {
    fn address(&self) -> Address;
    async fn decimals(&self) -> Result<u8, ProviderError>;
    async fn balance_of(&self, owner: Address) -> Result<U256, ProviderError>;
    /// Broadcasts `transfer(to, amount)` and returns the pending transaction hash.
    async fn transfer(&self, to: Address, amount: U256) -> Result<B256, ProviderError>;
}

/// Read-only ERC-20 queries against any token on one network.
#[async_trait]
pub trait TokenReader: Send + Sync {
    async fn decimals(&self, token: Address) -> Result<u8, ProviderError>;
    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentopay_core::registry::CELO_ALFAJORES;

    #[test]
    fn rpc_codes_map_to_wallet_errors() {
        assert_eq!(ProviderError::from_rpc(4001, "denied"), ProviderError::UserRejected);
        assert_eq!(ProviderError::from_rpc(4100, "unauthorized"), ProviderError::NoAccount);
        assert!(matches!(
            ProviderError::from_rpc(-32000, "boom"),
            ProviderError::Rpc { code: -32000, .. }
        ));
    }

    #[test]
    fn add_chain_params_follow_eip3085() {
        let params = AddChainParams::for_chain(&CELO_ALFAJORES, CELO_ALFAJORES.rpc_url);
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["chainId"], "0xaef3");
        assert_eq!(json["chainName"], "Celo Alfajores Testnet");
        assert_eq!(json["nativeCurrency"]["decimals"], 18);
        assert_eq!(json["rpcUrls"][0], "https://alfajores-forno.celo-testnet.org");
        assert_eq!(json["blockExplorerUrls"][0], "https://alfajores.celoscan.io");
    }
}
