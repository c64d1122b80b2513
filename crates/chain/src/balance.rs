use crate::rpc::JsonRpcClient;
use crate::{ProviderError, TokenReader};
use alloy_primitives::{Address, U256};
use anyhow::{anyhow, Context, Result};
use mentopay_core::models::{Currency, Network};
use mentopay_core::registry;
use mentopay_core::units::format_base_units;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub symbol: String,
    pub address: Address,
    pub raw_balance: String,
    pub decimals: u8,
    pub balance: String,
}

/// Reads stable token balances for display. Failures read as zero.
#[derive(Clone, Default)]
pub struct BalanceReader {
    readers: HashMap<Network, Arc<dyn TokenReader>>,
}

impl BalanceReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader backed by each network's RPC endpoint, taken from `overrides`
    /// when present and from the registry otherwise.
    pub fn from_rpc_urls(overrides: &HashMap<Network, String>) -> Result<Self, ProviderError> {
        let mut reader = Self::new();
        for network in Network::variants() {
            let url = overrides
                .get(network)
                .map(String::as_str)
                .unwrap_or(registry::chain(*network).rpc_url);
            reader = reader.with_reader(*network, Arc::new(JsonRpcClient::new(url)?));
        }
        Ok(reader)
    }

    pub fn with_reader(mut self, network: Network, reader: Arc<dyn TokenReader>) -> Self {
        self.readers.insert(network, reader);
        self
    }

    /// Human-scaled balance of `account` in the token named `symbol`.
    ///
    /// Returns "0" on any failure so that balance display never blocks.
    pub async fn balance(&self, symbol: &str, network: Network, account: &str) -> String {
        match self.lookup(symbol, network, account).await {
            Ok(b) => b.balance,
            Err(e) => {
                tracing::debug!(%symbol, %network, %account, error = %e, "balance lookup failed");
                "0".to_string()
            }
        }
    }

    /// Balance of every registered token on `network`.
    pub async fn balances(&self, network: Network, account: &str) -> Vec<TokenBalance> {
        let mut out = Vec::new();
        for (currency, address) in registry::tokens_on(network) {
            let entry = match self.lookup(currency.symbol(), network, account).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::debug!(symbol = %currency, %network, error = %e, "balance lookup failed");
                    TokenBalance {
                        symbol: currency.symbol().to_string(),
                        address,
                        raw_balance: "0".to_string(),
                        decimals: 0,
                        balance: "0".to_string(),
                    }
                }
            };
            out.push(entry);
        }
        out
    }

    async fn lookup(&self, symbol: &str, network: Network, account: &str) -> Result<TokenBalance> {
        let currency = Currency::from_str(symbol)?;
        let token = registry::token_address(currency, network)
            .ok_or_else(|| anyhow!("{currency} is not deployed on {network}"))?;
        let owner = Address::from_str(account.trim())
            .with_context(|| format!("invalid account address: {account}"))?;
        let reader = self
            .readers
            .get(&network)
            .ok_or_else(|| anyhow!("no reader configured for {network}"))?;

        let decimals = reader.decimals(token).await?;
        let raw: U256 = reader.balance_of(token, owner).await?;

        Ok(TokenBalance {
            symbol: currency.symbol().to_string(),
            address: token,
            raw_balance: raw.to_string(),
            decimals,
            balance: format_base_units(raw, decimals),
        })
    }
}
