mod rules;

use crate::ids::InvoiceIds;
use crate::models::{Currency, Invoice, InvoiceItem, InvoiceStatus, Network};
use crate::units::format_total;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One line of the invoice form, as entered.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftItem {
    pub description: String,
    pub amount: String,
}

impl DraftItem {
    pub fn new(description: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            amount: amount.into(),
        }
    }
}

/// Unvalidated invoice form contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub items: Vec<DraftItem>,
    pub currency: Option<Currency>,
    #[serde(default)]
    pub network: Network,
    pub recipient_address: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invoice rejected: {}", .0.join("; "))]
    Invalid(Vec<String>),
    #[error("could not allocate invoice id: {0}")]
    Ids(#[source] anyhow::Error),
}

/// Validate `draft` and assemble a pending invoice stamped with the current time.
pub fn build_invoice(draft: &InvoiceDraft, ids: &dyn InvoiceIds) -> Result<Invoice, BuildError> {
    build_invoice_at(draft, ids, Utc::now())
}

/// Same as [`build_invoice`] with an explicit creation time.
///
/// No id is consumed when the draft is rejected.
pub fn build_invoice_at(
    draft: &InvoiceDraft,
    ids: &dyn InvoiceIds,
    created_at: DateTime<Utc>,
) -> Result<Invoice, BuildError> {
    let checked = rules::check_draft(draft).map_err(BuildError::Invalid)?;

    let items = checked
        .items
        .into_iter()
        .enumerate()
        .map(|(idx, (description, amount, _))| InvoiceItem {
            id: format!("item-{}", idx + 1),
            description,
            amount,
        })
        .collect();

    let id = ids.next_id().map_err(BuildError::Ids)?;

    Ok(Invoice {
        id,
        items,
        currency: checked.currency,
        total_amount: format_total(checked.total),
        created_at,
        status: InvoiceStatus::Pending,
        network: draft.network,
        recipient_address: checked.recipient_address,
        due_date: draft.due_date,
        tx_hash: None,
    })
}
