//! Static chain and token registry.
//!
//! Chain metadata and Mento stable token deployments for the two supported
//! Celo networks. Everything here is immutable configuration.

use crate::models::{Currency, Network};
use alloy_primitives::Address;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Chain metadata used for network detection, switching and links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub network: Network,
    pub chain_id: u64,
    pub name: &'static str,
    pub native_currency: NativeCurrency,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
}

impl ChainInfo {
    /// Chain id as the `0x`-prefixed quantity wallets expect.
    pub fn chain_id_hex(&self) -> String {
        format!("0x{:x}", self.chain_id)
    }

    pub fn tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

const CELO: NativeCurrency = NativeCurrency {
    name: "CELO",
    symbol: "CELO",
    decimals: 18,
};

pub const CELO_MAINNET: ChainInfo = ChainInfo {
    network: Network::Mainnet,
    chain_id: 42220,
    name: "Celo Mainnet",
    native_currency: CELO,
    rpc_url: "https://forno.celo.org",
    explorer_url: "https://celoscan.io",
};

pub const CELO_ALFAJORES: ChainInfo = ChainInfo {
    network: Network::Testnet,
    chain_id: 44787,
    name: "Celo Alfajores Testnet",
    native_currency: CELO,
    rpc_url: "https://alfajores-forno.celo-testnet.org",
    explorer_url: "https://alfajores.celoscan.io",
};

pub fn chain(network: Network) -> &'static ChainInfo {
    match network {
        Network::Mainnet => &CELO_MAINNET,
        Network::Testnet => &CELO_ALFAJORES,
    }
}

pub fn network_for_chain_id(chain_id: u64) -> Option<Network> {
    Network::variants()
        .iter()
        .copied()
        .find(|n| chain(*n).chain_id == chain_id)
}

const TOKEN_DEPLOYMENTS: &[(Currency, Network, &str)] = &[
    (Currency::CUsd, Network::Mainnet, "0x765de816845861e75a25fca122bb6898b8b1282a"),
    (Currency::CEur, Network::Mainnet, "0xd8763cba276a3738e6de85b4b3bf5fded6d6ca73"),
    (Currency::CReal, Network::Mainnet, "0xe8537a3d056da446677b9e9d6c5db704eaab4787"),
    (Currency::CUsd, Network::Testnet, "0x874069fa1eb16d44d622f2e0ca25eea172369bc1"),
    (Currency::CEur, Network::Testnet, "0x10c892a6ec43a53e45d0b916b4b7d383b1b78c0f"),
    (Currency::CReal, Network::Testnet, "0xe4d517785d091d3c54818832db6094bcc2744545"),
];

static TOKENS: Lazy<HashMap<(Currency, Network), Address>> = Lazy::new(|| {
    TOKEN_DEPLOYMENTS
        .iter()
        .filter_map(|(currency, network, addr)| {
            Address::from_str(addr)
                .ok()
                .map(|a| ((*currency, *network), a))
        })
        .collect()
});

/// Contract address of `currency` on `network`.
pub fn token_address(currency: Currency, network: Network) -> Option<Address> {
    TOKENS.get(&(currency, network)).copied()
}

/// Like [`token_address`], keyed by the token symbol as entered by a user.
pub fn token_address_for_symbol(symbol: &str, network: Network) -> Option<Address> {
    let currency = Currency::from_str(symbol).ok()?;
    token_address(currency, network)
}

/// Every registered token deployment on `network`, in currency order.
pub fn tokens_on(network: Network) -> Vec<(Currency, Address)> {
    Currency::variants()
        .iter()
        .filter_map(|c| token_address(*c, network).map(|a| (*c, a)))
        .collect()
}
