use crate::AppContext;
use chain::balance::TokenBalance;
use ledger::{AuditEvent, Notice, PaymentOutcome};
use mentopay_core::builder::{build_invoice, InvoiceDraft};
use mentopay_core::models::{Invoice, Network};
use mentopay_core::registry;
use serde::{Deserialize, Serialize};

/// Invoice plus the links a host shows next to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub pay_link: String,
    pub share_text: String,
    pub tx_url: Option<String>,
}

impl InvoiceView {
    fn new(invoice: Invoice, origin: &str) -> Self {
        let tx_url = invoice
            .tx_hash
            .as_deref()
            .map(|hash| registry::chain(invoice.network).tx_url(hash));
        Self {
            pay_link: invoice.pay_link(origin),
            share_text: invoice.share_text(),
            tx_url,
            invoice,
        }
    }
}

pub async fn create_invoice(ctx: &AppContext, draft: InvoiceDraft) -> Result<InvoiceView, String> {
    let invoice = build_invoice(&draft, ctx.ids.as_ref()).map_err(|e| e.to_string())?;
    ctx.store.save(&invoice).map_err(|e| e.to_string())?;

    if let Some(log) = &ctx.audit {
        let mut event = AuditEvent::new("invoice_created", &invoice.id, "pending").with_payment(
            invoice.total_amount.clone(),
            invoice.currency.to_string(),
            invoice.recipient_address.clone(),
        );
        if let Ok(hash) = invoice.digest() {
            event = event.with_hash(hash);
        }
        if let Err(e) = log.write(&event) {
            tracing::warn!(invoice_id = %invoice.id, error = %e, "failed to write audit event");
        }
    }

    tracing::info!(invoice_id = %invoice.id, total = %invoice.total_amount, currency = %invoice.currency, "invoice created");
    Ok(InvoiceView::new(invoice, &ctx.config.public_origin))
}

pub async fn get_invoice(ctx: &AppContext, invoice_id: String) -> Result<Option<InvoiceView>, String> {
    let invoice = ctx.store.get(&invoice_id).map_err(|e| e.to_string())?;
    Ok(invoice.map(|inv| InvoiceView::new(inv, &ctx.config.public_origin)))
}

pub async fn list_invoices(ctx: &AppContext) -> Result<Vec<InvoiceView>, String> {
    let invoices = ctx.store.list().map_err(|e| e.to_string())?;
    Ok(invoices
        .into_iter()
        .map(|inv| InvoiceView::new(inv, &ctx.config.public_origin))
        .collect())
}

pub async fn token_balance(
    ctx: &AppContext,
    symbol: String,
    network: Network,
    account: String,
) -> Result<String, String> {
    Ok(ctx.balances.balance(&symbol, network, &account).await)
}

pub async fn token_balances(
    ctx: &AppContext,
    network: Network,
    account: String,
) -> Result<Vec<TokenBalance>, String> {
    Ok(ctx.balances.balances(network, &account).await)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub status: PaymentStatus,
    pub invoice: Option<InvoiceView>,
    pub notice: Option<Notice>,
}

pub async fn pay_invoice(ctx: &AppContext, invoice_id: String) -> Result<PaymentResponse, String> {
    let origin = &ctx.config.public_origin;
    let outcome = ctx.executor.pay(&invoice_id).await;
    let response = match outcome {
        PaymentOutcome::Paid(invoice) => PaymentResponse {
            status: PaymentStatus::Paid,
            invoice: Some(InvoiceView::new(invoice, origin)),
            notice: None,
        },
        PaymentOutcome::Failed(err) => PaymentResponse {
            status: PaymentStatus::Failed,
            invoice: get_invoice(ctx, invoice_id).await?,
            notice: Some(err.notice()),
        },
        PaymentOutcome::Skipped(_) => PaymentResponse {
            status: PaymentStatus::Skipped,
            invoice: get_invoice(ctx, invoice_id).await?,
            notice: None,
        },
    };
    Ok(response)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub wallet_kind: String,
    pub wallet_endpoint: Option<String>,
    pub mainnet_rpc: Option<String>,
    pub testnet_rpc: Option<String>,
    pub default_network: Network,
    pub public_origin: String,
}

pub async fn get_settings() -> Result<Settings, String> {
    let cfg = config::load().map_err(|e| e.to_string())?;
    Ok(Settings {
        wallet_kind: cfg.wallet.kind,
        wallet_endpoint: cfg.wallet.endpoint,
        mainnet_rpc: cfg.networks.mainnet_rpc,
        testnet_rpc: cfg.networks.testnet_rpc,
        default_network: cfg.networks.default_network,
        public_origin: cfg.public_origin,
    })
}

pub async fn update_settings(settings: Settings) -> Result<(), String> {
    let mut cfg = config::load().unwrap_or_default();

    cfg.wallet.kind = settings.wallet_kind;
    cfg.wallet.endpoint = settings.wallet_endpoint;
    cfg.networks.mainnet_rpc = settings.mainnet_rpc;
    cfg.networks.testnet_rpc = settings.testnet_rpc;
    cfg.networks.default_network = settings.default_network;
    cfg.public_origin = settings.public_origin;

    config::store(&cfg).map_err(|e| e.to_string())?;
    tracing::info!("Settings updated");
    Ok(())
}

pub async fn wallet_session_id() -> Result<Option<String>, String> {
    Ok(config::wallet_session_id())
}
