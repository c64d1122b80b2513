//! Wiring for a MentoPay host: configuration, storage, wallet, and the
//! command surface the presentation layer calls.

pub mod commands;

use anyhow::{anyhow, Result};
use chain::balance::BalanceReader;
use chain::eip1193::Eip1193Wallet;
use chain::mock::MockWallet;
use chain::WalletProvider;
use config::AppConfig;
use ledger::{AuditLog, InvoiceStore, LogObserver, PaymentExecutor, PaymentObserver, StoredIds};
use mentopay_core::ids::InvoiceIds;
use mentopay_core::registry;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Later calls are ignored.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(env_filter))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

fn create_wallet(cfg: &AppConfig) -> Result<Option<Arc<dyn WalletProvider>>> {
    match cfg.wallet.kind.as_str() {
        "eip1193" => {
            let endpoint = cfg
                .wallet
                .endpoint
                .clone()
                .ok_or_else(|| anyhow!("wallet endpoint not configured"))?;
            tracing::info!(%endpoint, "Using EIP-1193 wallet endpoint");
            let wallet: Arc<dyn WalletProvider> = Eip1193Wallet::with_poll_interval(
                endpoint,
                Duration::from_millis(cfg.wallet.poll_interval_ms),
            )?;
            Ok(Some(wallet))
        }
        "none" => {
            tracing::info!("No wallet provider configured");
            Ok(None)
        }
        _ => {
            tracing::info!("Using mock wallet");
            let chain_id = registry::chain(cfg.networks.default_network).chain_id;
            let wallet: Arc<dyn WalletProvider> = Arc::new(MockWallet::new(chain_id));
            Ok(Some(wallet))
        }
    }
}

pub struct AppContext {
    pub config: AppConfig,
    store: InvoiceStore,
    ids: Arc<dyn InvoiceIds>,
    balances: BalanceReader,
    executor: PaymentExecutor,
    audit: Option<AuditLog>,
}

impl AppContext {
    /// Build everything from `cfg`: the on-disk store and its id counter, the
    /// configured wallet, and RPC-backed balance reads.
    pub fn bootstrap(cfg: AppConfig) -> Result<Self> {
        let store = InvoiceStore::open(&cfg.storage.path)?;
        let ids: Arc<dyn InvoiceIds> = Arc::new(StoredIds::new(&store)?);
        let wallet = create_wallet(&cfg)?;
        let balances = BalanceReader::from_rpc_urls(&cfg.networks.rpc_overrides())?;
        Ok(Self::with_parts(cfg, store, ids, wallet, balances, Arc::new(LogObserver)))
    }

    pub fn with_parts(
        cfg: AppConfig,
        store: InvoiceStore,
        ids: Arc<dyn InvoiceIds>,
        wallet: Option<Arc<dyn WalletProvider>>,
        balances: BalanceReader,
        observer: Arc<dyn PaymentObserver>,
    ) -> Self {
        let audit = cfg.storage.audit_log.as_ref().map(AuditLog::new);

        let mut executor = PaymentExecutor::new(store.clone(), wallet).with_observer(observer);
        for (network, url) in cfg.networks.rpc_overrides() {
            executor = executor.with_rpc_url(network, url);
        }
        if let Some(log) = &audit {
            executor = executor.with_audit(log.clone());
        }

        Self {
            config: cfg,
            store,
            ids,
            balances,
            executor,
            audit,
        }
    }
}
