use anyhow::{Context, Result};
use mentopay_core::models::Network;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const APP_NAME: &str = "mentopay";
const KEYCHAIN_SERVICE: &str = "io.mentopay.credentials";

pub const WALLET_SESSION_ENV: &str = "MENTOPAY_WALLET_SESSION_ID";
pub const WALLET_SESSION_SECRET: &str = "wallet_session_id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub wallet: WalletConfig,
    #[serde(default)]
    pub networks: NetworkConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Origin pay links are built on, e.g. `https://pay.example.com`.
    #[serde(default = "default_public_origin")]
    pub public_origin: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            wallet: WalletConfig::default(),
            networks: NetworkConfig::default(),
            storage: StorageConfig::default(),
            public_origin: default_public_origin(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletConfig {
    #[serde(default = "default_wallet_kind")]
    pub kind: String, // "mock" | "eip1193"
    pub endpoint: Option<String>,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            kind: default_wallet_kind(),
            endpoint: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    #[serde(default)]
    pub default_network: Network,
    pub mainnet_rpc: Option<String>,
    pub testnet_rpc: Option<String>,
}

impl NetworkConfig {
    /// RPC endpoints that replace the registry defaults.
    pub fn rpc_overrides(&self) -> HashMap<Network, String> {
        let mut out = HashMap::new();
        if let Some(url) = &self.mainnet_rpc {
            out.insert(Network::Mainnet, url.clone());
        }
        if let Some(url) = &self.testnet_rpc {
            out.insert(Network::Testnet, url.clone());
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_store_path")]
    pub path: String,
    pub audit_log: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            audit_log: Some("mentopay_audit.jsonl".to_string()),
        }
    }
}

fn default_wallet_kind() -> String {
    "mock".to_string()
}

fn default_poll_interval_ms() -> u64 {
    2_000
}

fn default_store_path() -> String {
    ".mentopay_store".to_string()
}

fn default_public_origin() -> String {
    "http://localhost:8080".to_string()
}

pub fn load() -> Result<AppConfig> {
    let cfg: AppConfig = confy::load(APP_NAME, None).context("Failed to load app config")?;
    Ok(cfg)
}

pub fn store(cfg: &AppConfig) -> Result<()> {
    confy::store(APP_NAME, None, cfg).context("Failed to store app config")?;
    Ok(())
}

/// Retrieve a secret from the OS keychain
pub fn get_secret(key: &str) -> Result<String> {
    let entry = keyring::Entry::new(KEYCHAIN_SERVICE, key)?;
    let password = entry.get_password()?;
    Ok(password)
}

/// Identifier the host needs to set up a wallet-connection session.
/// The environment wins over the keychain.
pub fn wallet_session_id() -> Option<String> {
    std::env::var(WALLET_SESSION_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .or_else(|| get_secret(WALLET_SESSION_SECRET).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.wallet.kind, "mock");
        assert_eq!(cfg.networks.default_network, Network::Testnet);
        assert_eq!(cfg.storage.path, ".mentopay_store");
    }

    #[test]
    fn rpc_overrides_only_list_configured_networks() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{"networks": {"default_network": "mainnet", "mainnet_rpc": "https://rpc.example"}}"#,
        )
        .unwrap();
        let overrides = cfg.networks.rpc_overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[&Network::Mainnet], "https://rpc.example");
        assert_eq!(cfg.networks.default_network, Network::Mainnet);
    }
}
