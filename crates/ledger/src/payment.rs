//! Invoice payment: network check, ERC-20 transfer, confirmation.
//!
//! `PaymentExecutor::pay` walks one invoice through
//! `Idle -> Submitting -> Confirming -> Paid`, or drops to `Failed` and back
//! to `Idle` on any error. The stored invoice only changes once the transfer
//! is confirmed. The executor keeps no lock of its own; callers must not start
//! a second payment for the same invoice while one is in flight.

use crate::audit::{AuditEvent, AuditLog};
use crate::store::InvoiceStore;
use alloy_primitives::{Address, U256};
use chain::{AddChainParams, ProviderError, WalletProvider};
use mentopay_core::models::{Currency, Invoice, InvoiceStatus, Network};
use mentopay_core::registry;
use mentopay_core::units::to_base_units;
use serde::Serialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PaymentState {
    Idle,
    Submitting,
    Confirming { tx_hash: String },
    Paid { tx_hash: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaymentError {
    #[error("invoice {0} not found")]
    InvoiceNotFound(String),
    #[error("no wallet provider detected")]
    ProviderMissing,
    #[error("wallet is not on {expected}: {reason}")]
    NetworkMismatch { expected: String, reason: String },
    #[error("request rejected in wallet")]
    UserRejected,
    #[error("insufficient balance: {required} {currency} required")]
    InsufficientBalance { required: String, currency: Currency },
    #[error("network error: {0}")]
    Network(String),
    #[error("payment failed: {0}")]
    Failed(String),
}

/// What the user is shown when a payment does not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl PaymentError {
    pub fn notice(&self) -> Notice {
        let (title, message) = match self {
            PaymentError::InvoiceNotFound(_) => (
                "Invoice Not Found",
                "The invoice you're looking for doesn't exist or has been removed.".to_string(),
            ),
            PaymentError::ProviderMissing => (
                "Wallet Not Found",
                "No wallet detected. Install or connect a wallet to pay this invoice.".to_string(),
            ),
            PaymentError::NetworkMismatch { expected, .. } => (
                "Wrong Network",
                format!("Please switch your wallet to {expected} and try again."),
            ),
            PaymentError::UserRejected => (
                "Payment Cancelled",
                "The request was rejected in your wallet.".to_string(),
            ),
            PaymentError::InsufficientBalance { required, currency } => (
                "Insufficient Balance",
                format!("You need at least {required} {currency} to pay this invoice."),
            ),
            PaymentError::Network(_) => (
                "Network Error",
                "Could not reach the Celo network. Check your connection and try again.".to_string(),
            ),
            PaymentError::Failed(detail) => ("Payment Failed", detail.clone()),
        };
        Notice {
            title: title.to_string(),
            message,
        }
    }
}

impl From<ProviderError> for PaymentError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NoAccount => PaymentError::ProviderMissing,
            ProviderError::UserRejected => PaymentError::UserRejected,
            ProviderError::UnrecognizedChain(id) => PaymentError::NetworkMismatch {
                expected: registry::network_for_chain_id(id)
                    .map(|n| registry::chain(n).name.to_string())
                    .unwrap_or_else(|| format!("chain {id}")),
                reason: format!("chain {id} is not known to the wallet"),
            },
            ProviderError::Transport(msg) => PaymentError::Network(msg),
            ProviderError::Rpc { message, .. } if message.to_lowercase().contains("insufficient funds") => {
                PaymentError::Failed("Not enough CELO to cover the network fee.".to_string())
            }
            ProviderError::Rpc { message, .. } => PaymentError::Failed(message),
            ProviderError::Decode(msg) => PaymentError::Failed(msg),
            ProviderError::Reverted(hash) => PaymentError::Failed(format!("Transaction {hash} reverted.")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Paid(Invoice),
    Failed(PaymentError),
    /// The invoice was not pending; nothing happened.
    Skipped(InvoiceStatus),
}

/// Receives state changes and the final result of each payment.
pub trait PaymentObserver: Send + Sync {
    fn on_state(&self, _invoice_id: &str, _state: &PaymentState) {}
    fn on_paid(&self, _invoice: &Invoice) {}
    fn on_failed(&self, _invoice_id: &str, _notice: &Notice) {}
}

/// Observer that only logs.
#[derive(Debug, Default)]
pub struct LogObserver;

impl PaymentObserver for LogObserver {
    fn on_state(&self, invoice_id: &str, state: &PaymentState) {
        tracing::debug!(%invoice_id, ?state, "payment state changed");
    }

    fn on_paid(&self, invoice: &Invoice) {
        tracing::info!(invoice_id = %invoice.id, tx_hash = ?invoice.tx_hash, "invoice paid");
    }

    fn on_failed(&self, invoice_id: &str, notice: &Notice) {
        tracing::warn!(%invoice_id, title = %notice.title, message = %notice.message, "payment failed");
    }
}

pub struct PaymentExecutor {
    store: InvoiceStore,
    wallet: Option<Arc<dyn WalletProvider>>,
    observer: Arc<dyn PaymentObserver>,
    audit: Option<AuditLog>,
    rpc_urls: HashMap<Network, String>,
}

impl PaymentExecutor {
    pub fn new(store: InvoiceStore, wallet: Option<Arc<dyn WalletProvider>>) -> Self {
        Self {
            store,
            wallet,
            observer: Arc::new(LogObserver),
            audit: None,
            rpc_urls: HashMap::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn PaymentObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    /// RPC endpoint handed to the wallet when it has to add `network`.
    pub fn with_rpc_url(mut self, network: Network, url: impl Into<String>) -> Self {
        self.rpc_urls.insert(network, url.into());
        self
    }

    fn rpc_url(&self, network: Network) -> &str {
        self.rpc_urls
            .get(&network)
            .map(String::as_str)
            .unwrap_or(registry::chain(network).rpc_url)
    }

    fn transition(&self, invoice_id: &str, state: PaymentState) {
        self.observer.on_state(invoice_id, &state);
    }

    fn audit(&self, event: AuditEvent) {
        if let Some(log) = &self.audit {
            if let Err(e) = log.write(&event) {
                tracing::warn!(error = %e, "failed to write audit event");
            }
        }
    }

    /// Refuse a payment before it starts. No state transition happens.
    fn refuse(&self, invoice_id: &str, err: PaymentError) -> PaymentOutcome {
        tracing::info!(%invoice_id, error = %err, "payment not started");
        self.observer.on_failed(invoice_id, &err.notice());
        PaymentOutcome::Failed(err)
    }

    /// Pay the stored invoice `invoice_id` from the connected wallet.
    pub async fn pay(&self, invoice_id: &str) -> PaymentOutcome {
        let invoice = match self.store.get(invoice_id) {
            Ok(Some(inv)) => inv,
            Ok(None) => {
                return self.refuse(invoice_id, PaymentError::InvoiceNotFound(invoice_id.to_string()))
            }
            Err(e) => return self.refuse(invoice_id, PaymentError::Failed(e.to_string())),
        };

        if !invoice.is_pending() {
            tracing::info!(%invoice_id, status = %invoice.status, "invoice not pending; skipping payment");
            return PaymentOutcome::Skipped(invoice.status);
        }

        let Some(wallet) = self.wallet.as_ref() else {
            return self.refuse(invoice_id, PaymentError::ProviderMissing);
        };
        let payer = match wallet.account().await {
            Ok(Some(account)) => account,
            Ok(None)
            | Err(ProviderError::NoAccount)
            | Err(ProviderError::Transport(_)) => {
                return self.refuse(invoice_id, PaymentError::ProviderMissing)
            }
            Err(e) => return self.refuse(invoice_id, e.into()),
        };

        self.transition(invoice_id, PaymentState::Submitting);
        match self.submit(wallet.as_ref(), payer, &invoice).await {
            Ok(paid) => {
                let tx_hash = paid.tx_hash.clone().unwrap_or_default();
                self.transition(invoice_id, PaymentState::Paid { tx_hash: tx_hash.clone() });
                self.audit(AuditEvent::new("invoice_paid", invoice_id, "paid").with_tx_hash(tx_hash));
                self.observer.on_paid(&paid);
                PaymentOutcome::Paid(paid)
            }
            Err(err) => {
                tracing::warn!(%invoice_id, error = %err, "payment failed");
                self.transition(
                    invoice_id,
                    PaymentState::Failed {
                        reason: err.to_string(),
                    },
                );
                self.audit(AuditEvent::new("payment_failed", invoice_id, "failed").with_error(err.to_string()));
                self.observer.on_failed(invoice_id, &err.notice());
                self.transition(invoice_id, PaymentState::Idle);
                PaymentOutcome::Failed(err)
            }
        }
    }

    async fn submit(
        &self,
        wallet: &dyn WalletProvider,
        payer: Address,
        invoice: &Invoice,
    ) -> Result<Invoice, PaymentError> {
        self.ensure_network(wallet, invoice.network).await?;

        let token = registry::token_address(invoice.currency, invoice.network).ok_or_else(|| {
            PaymentError::Failed(format!("{} is not available on {}.", invoice.currency, invoice.network))
        })?;
        let recipient = Address::from_str(invoice.recipient_address.trim())
            .map_err(|_| PaymentError::Failed("Invoice recipient address is invalid.".to_string()))?;
        let contract = wallet.token(token, payer);

        let decimals = contract.decimals().await?;
        let required: U256 = to_base_units(&invoice.total_amount, decimals)
            .map_err(|e| PaymentError::Failed(e.to_string()))?;
        if required.is_zero() {
            return Err(PaymentError::Failed(format!(
                "Invoice total {} {} is too small to transfer.",
                invoice.total_amount, invoice.currency
            )));
        }

        let balance = contract.balance_of(payer).await?;
        if balance < required {
            tracing::info!(invoice_id = %invoice.id, %balance, %required, "balance too low");
            return Err(PaymentError::InsufficientBalance {
                required: invoice.total_amount.clone(),
                currency: invoice.currency,
            });
        }

        let pending = contract.transfer(recipient, required).await?;
        let pending_hash = pending.to_string();
        self.transition(
            &invoice.id,
            PaymentState::Confirming {
                tx_hash: pending_hash.clone(),
            },
        );
        let mut submitted = AuditEvent::new("payment_submitted", &invoice.id, "confirming")
            .with_tx_hash(pending_hash)
            .with_payment(
                invoice.total_amount.clone(),
                invoice.currency.to_string(),
                invoice.recipient_address.clone(),
            );
        if let Ok(hash) = invoice.digest() {
            submitted = submitted.with_hash(hash);
        }
        self.audit(submitted);

        let receipt = wallet.wait_for_receipt(pending).await?;
        if !receipt.success {
            return Err(ProviderError::Reverted(receipt.tx_hash).into());
        }

        let mut paid = invoice.clone();
        paid.mark_paid(receipt.tx_hash.to_string())
            .map_err(|e| PaymentError::Failed(e.to_string()))?;
        self.store.save(&paid).map_err(|e| {
            tracing::error!(invoice_id = %paid.id, tx_hash = %receipt.tx_hash, error = %e, "payment confirmed but invoice not saved");
            PaymentError::Failed(format!("Payment confirmed but the invoice could not be updated: {e}"))
        })?;
        Ok(paid)
    }

    /// Make sure the wallet is on the invoice's chain, switching (and adding
    /// the chain first if the wallet does not know it) when needed.
    async fn ensure_network(&self, wallet: &dyn WalletProvider, network: Network) -> Result<(), PaymentError> {
        let chain = registry::chain(network);
        let current = wallet.chain_id().await?;
        if current == chain.chain_id {
            return Ok(());
        }

        tracing::info!(current, required = chain.chain_id, "switching wallet network");
        let mismatch = |e: ProviderError| PaymentError::NetworkMismatch {
            expected: chain.name.to_string(),
            reason: e.to_string(),
        };
        match wallet.switch_chain(chain.chain_id).await {
            Ok(()) => Ok(()),
            Err(ProviderError::UnrecognizedChain(_)) => {
                let params = AddChainParams::for_chain(chain, self.rpc_url(network));
                wallet.add_chain(&params).await.map_err(mismatch)?;
                wallet.switch_chain(chain.chain_id).await.map_err(mismatch)
            }
            Err(e) => Err(mismatch(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain::mock::MockWallet;
    use mentopay_core::builder::{build_invoice, DraftItem, InvoiceDraft};
    use mentopay_core::ids::SequentialIds;
    use mentopay_core::registry::{token_address, CELO_ALFAJORES, CELO_MAINNET};
    use std::sync::Mutex;

    const RECIPIENT: &str = "0x2222222222222222222222222222222222222222";

    fn payer() -> Address {
        Address::repeat_byte(0x0a)
    }

    fn cusd() -> Address {
        token_address(Currency::CUsd, Network::Testnet).unwrap()
    }

    fn ether(whole: u64) -> U256 {
        U256::from(whole) * U256::from(10u64).pow(U256::from(18u8))
    }

    #[derive(Default)]
    struct Recorder {
        states: Mutex<Vec<PaymentState>>,
        notices: Mutex<Vec<Notice>>,
        paid: Mutex<Vec<String>>,
    }

    impl PaymentObserver for Recorder {
        fn on_state(&self, _invoice_id: &str, state: &PaymentState) {
            self.states.lock().unwrap().push(state.clone());
        }

        fn on_paid(&self, invoice: &Invoice) {
            self.paid.lock().unwrap().push(invoice.id.clone());
        }

        fn on_failed(&self, _invoice_id: &str, notice: &Notice) {
            self.notices.lock().unwrap().push(notice.clone());
        }
    }

    fn seeded_store() -> (InvoiceStore, Invoice) {
        let store = InvoiceStore::temporary().unwrap();
        let draft = InvoiceDraft {
            items: vec![
                DraftItem::new("Design work", "100.00"),
                DraftItem::new("Hosting", "25.50"),
            ],
            currency: Some(Currency::CUsd),
            network: Network::Testnet,
            recipient_address: Some(RECIPIENT.to_string()),
            due_date: None,
        };
        let invoice = build_invoice(&draft, &SequentialIds::new()).unwrap();
        store.save(&invoice).unwrap();
        (store, invoice)
    }

    fn executor(store: &InvoiceStore, wallet: &MockWallet, recorder: &Arc<Recorder>) -> PaymentExecutor {
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        PaymentExecutor::new(store.clone(), Some(provider)).with_observer(recorder.clone())
    }

    fn funded_wallet(chain_id: u64, balance: U256) -> MockWallet {
        MockWallet::new(chain_id)
            .with_account(payer())
            .with_balance(cusd(), payer(), balance)
    }

    #[tokio::test]
    async fn pays_on_matching_chain_without_switching() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(200));
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        let paid = match outcome {
            PaymentOutcome::Paid(paid) => paid,
            other => panic!("expected payment to succeed, got {other:?}"),
        };
        let transfers = wallet.transfers();
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].to, Address::from_str(RECIPIENT).unwrap());
        assert_eq!(transfers[0].amount, U256::from(125_500_000_000_000_000_000u128));
        assert_eq!(paid.tx_hash, Some(transfers[0].tx_hash.to_string()));

        let stored = store.get(&invoice.id).unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Paid);
        assert_eq!(stored.tx_hash, paid.tx_hash);

        let requests = wallet.requests();
        assert!(!requests.iter().any(|r| r == "wallet_switchEthereumChain"));
        assert!(!requests.iter().any(|r| r == "wallet_addEthereumChain"));

        let states = recorder.states.lock().unwrap().clone();
        assert_eq!(states.len(), 3);
        assert_eq!(states[0], PaymentState::Submitting);
        assert!(matches!(states[1], PaymentState::Confirming { .. }));
        assert!(matches!(states[2], PaymentState::Paid { .. }));
        assert_eq!(recorder.paid.lock().unwrap().as_slice(), &[invoice.id.clone()]);
    }

    #[tokio::test]
    async fn paying_a_paid_invoice_is_a_noop() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(500));
        let recorder = Arc::new(Recorder::default());
        let exec = executor(&store, &wallet, &recorder);

        assert!(matches!(exec.pay(&invoice.id).await, PaymentOutcome::Paid(_)));
        let first = store.get(&invoice.id).unwrap().unwrap();
        let requests_after_first = wallet.requests().len();

        let again = exec.pay(&invoice.id).await;
        assert_eq!(again, PaymentOutcome::Skipped(InvoiceStatus::Paid));
        assert_eq!(wallet.transfers().len(), 1);
        assert_eq!(wallet.requests().len(), requests_after_first);
        assert_eq!(store.get(&invoice.id).unwrap().unwrap(), first);
    }

    #[tokio::test]
    async fn insufficient_balance_leaves_invoice_pending() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(125));
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert_eq!(
            outcome,
            PaymentOutcome::Failed(PaymentError::InsufficientBalance {
                required: "125.50".to_string(),
                currency: Currency::CUsd,
            })
        );
        assert!(wallet.transfers().is_empty());
        assert_eq!(store.get(&invoice.id).unwrap().unwrap().status, InvoiceStatus::Pending);

        let states = recorder.states.lock().unwrap().clone();
        assert!(matches!(states.as_slice(), [PaymentState::Submitting, PaymentState::Failed { .. }, PaymentState::Idle]));
        let notices = recorder.notices.lock().unwrap().clone();
        assert_eq!(notices[0].title, "Insufficient Balance");
        assert!(notices[0].message.contains("125.50 cUSD"));
    }

    #[tokio::test]
    async fn zero_total_is_never_transferred() {
        let store = InvoiceStore::temporary().unwrap();
        let mut invoice = seeded_store().1;
        invoice.total_amount = "0.00".to_string();
        store.save(&invoice).unwrap();
        let wallet = MockWallet::new(CELO_ALFAJORES.chain_id).with_account(payer());
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert!(matches!(outcome, PaymentOutcome::Failed(PaymentError::Failed(_))));
        assert!(wallet.transfers().is_empty());
        assert_eq!(store.get(&invoice.id).unwrap().unwrap().status, InvoiceStatus::Pending);
        assert_eq!(recorder.notices.lock().unwrap()[0].title, "Payment Failed");
    }

    #[tokio::test]
    async fn switches_to_known_chain() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_MAINNET.chain_id, ether(200)).with_known_chain(CELO_ALFAJORES.chain_id);
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert!(matches!(outcome, PaymentOutcome::Paid(_)));
        assert_eq!(wallet.current_chain(), CELO_ALFAJORES.chain_id);
        let requests = wallet.requests();
        assert_eq!(requests.iter().filter(|r| *r == "wallet_switchEthereumChain").count(), 1);
        assert!(!requests.iter().any(|r| r == "wallet_addEthereumChain"));
    }

    #[tokio::test]
    async fn adds_unknown_chain_then_switches() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_MAINNET.chain_id, ether(200));
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert!(matches!(outcome, PaymentOutcome::Paid(_)));
        let chain_requests: Vec<String> = wallet
            .requests()
            .into_iter()
            .filter(|r| r.starts_with("wallet_"))
            .collect();
        assert_eq!(
            chain_requests,
            vec![
                "wallet_switchEthereumChain",
                "wallet_addEthereumChain",
                "wallet_switchEthereumChain"
            ]
        );
    }

    #[tokio::test]
    async fn refused_switch_is_a_network_mismatch() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_MAINNET.chain_id, ether(200)).rejecting_switch();
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        match outcome {
            PaymentOutcome::Failed(PaymentError::NetworkMismatch { expected, .. }) => {
                assert_eq!(expected, "Celo Alfajores Testnet")
            }
            other => panic!("expected network mismatch, got {other:?}"),
        }
        assert!(wallet.transfers().is_empty());
        assert_eq!(store.get(&invoice.id).unwrap().unwrap().status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn rejected_transfer_maps_to_user_rejected() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(200)).rejecting_transfers();
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert_eq!(outcome, PaymentOutcome::Failed(PaymentError::UserRejected));
        assert_eq!(recorder.notices.lock().unwrap()[0].title, "Payment Cancelled");
        assert_eq!(store.get(&invoice.id).unwrap().unwrap().status, InvoiceStatus::Pending);
    }

    #[tokio::test]
    async fn reverted_transfer_keeps_invoice_pending() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(200)).reverting_transfers();
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay(&invoice.id).await;

        assert!(matches!(outcome, PaymentOutcome::Failed(PaymentError::Failed(_))));
        let stored = store.get(&invoice.id).unwrap().unwrap();
        assert_eq!(stored.status, InvoiceStatus::Pending);
        assert!(stored.tx_hash.is_none());
    }

    #[tokio::test]
    async fn missing_wallet_or_account_is_reported() {
        let (store, invoice) = seeded_store();
        let recorder = Arc::new(Recorder::default());

        let no_wallet = PaymentExecutor::new(store.clone(), None).with_observer(recorder.clone());
        assert_eq!(
            no_wallet.pay(&invoice.id).await,
            PaymentOutcome::Failed(PaymentError::ProviderMissing)
        );

        let disconnected = MockWallet::new(CELO_ALFAJORES.chain_id);
        let outcome = executor(&store, &disconnected, &recorder).pay(&invoice.id).await;
        assert_eq!(outcome, PaymentOutcome::Failed(PaymentError::ProviderMissing));

        // never entered submitting
        assert!(recorder.states.lock().unwrap().is_empty());
        assert_eq!(recorder.notices.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_invoice_is_not_found() {
        let (store, _) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(200));
        let recorder = Arc::new(Recorder::default());

        let outcome = executor(&store, &wallet, &recorder).pay("INV-999").await;
        assert_eq!(
            outcome,
            PaymentOutcome::Failed(PaymentError::InvoiceNotFound("INV-999".to_string()))
        );
    }

    #[tokio::test]
    async fn audit_log_records_submission_and_payment() {
        let (store, invoice) = seeded_store();
        let wallet = funded_wallet(CELO_ALFAJORES.chain_id, ether(200));
        let path = std::env::temp_dir().join(format!(
            "mentopay-payment-audit-{}-{}.jsonl",
            std::process::id(),
            chrono::Utc::now().timestamp_micros()
        ));
        let provider: Arc<dyn WalletProvider> = Arc::new(wallet.clone());
        let exec = PaymentExecutor::new(store, Some(provider)).with_audit(AuditLog::new(&path));

        assert!(matches!(exec.pay(&invoice.id).await, PaymentOutcome::Paid(_)));

        let contents = std::fs::read_to_string(&path).unwrap();
        let events: Vec<AuditEvent> = contents.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
        let kinds: Vec<&str> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["payment_submitted", "invoice_paid"]);
        assert_eq!(events[0].amount.as_deref(), Some("125.50"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn provider_errors_map_to_taxonomy() {
        assert_eq!(PaymentError::from(ProviderError::UserRejected), PaymentError::UserRejected);
        assert_eq!(PaymentError::from(ProviderError::NoAccount), PaymentError::ProviderMissing);
        assert!(matches!(
            PaymentError::from(ProviderError::Transport("timeout".into())),
            PaymentError::Network(_)
        ));
        assert!(matches!(
            PaymentError::from(ProviderError::UnrecognizedChain(42220)),
            PaymentError::NetworkMismatch { ref expected, .. } if expected == "Celo Mainnet"
        ));
        assert_eq!(
            PaymentError::from(ProviderError::Rpc {
                code: -32000,
                message: "insufficient funds for gas * price + value".into()
            })
            .notice()
            .message,
            "Not enough CELO to cover the network fee."
        );
    }
}
