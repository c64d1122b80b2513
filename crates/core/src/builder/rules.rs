use crate::models::Currency;
use crate::units::{format_total, parse_amount};
use alloy_primitives::Address;
use rust_decimal::Decimal;
use std::str::FromStr;

use super::{DraftItem, InvoiceDraft};

/// A draft that passed every check, with incomplete entries removed.
#[derive(Debug, Clone)]
pub(crate) struct CheckedDraft {
    pub items: Vec<(String, String, Decimal)>,
    pub total: Decimal,
    pub currency: Currency,
    pub recipient_address: String,
}

fn is_complete(item: &DraftItem) -> bool {
    !item.description.trim().is_empty() && !item.amount.trim().is_empty()
}

pub(crate) fn check_draft(draft: &InvoiceDraft) -> Result<CheckedDraft, Vec<String>> {
    let mut errs = Vec::new();

    let mut items = Vec::new();
    for (idx, item) in draft.items.iter().filter(|i| is_complete(i)).enumerate() {
        match parse_amount(&item.amount) {
            Ok(amount) => items.push((
                item.description.trim().to_string(),
                item.amount.trim().to_string(),
                amount,
            )),
            Err(e) => errs.push(format!("Item {}: {}", idx + 1, e)),
        }
    }
    if items.is_empty() && errs.is_empty() {
        errs.push("At least one item with a description and amount is required".to_string());
    }

    let total = items
        .iter()
        .try_fold(Decimal::ZERO, |acc, (_, _, amount)| acc.checked_add(*amount));
    match total {
        None => errs.push("Total amount is too large".to_string()),
        Some(total) if !items.is_empty() && format_total(total) == format_total(Decimal::ZERO) => {
            errs.push("Total amount must be at least 0.01".to_string())
        }
        Some(_) => {}
    }

    if draft.currency.is_none() {
        errs.push("Currency is required".to_string());
    }

    let recipient = draft
        .recipient_address
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    match recipient {
        None => errs.push("Recipient address is required".to_string()),
        Some(addr) if Address::from_str(addr).is_err() => {
            errs.push(format!("Recipient address is not a valid account address: {addr}"))
        }
        Some(_) => {}
    }

    match (errs.is_empty(), draft.currency, recipient, total) {
        (true, Some(currency), Some(addr), Some(total)) => Ok(CheckedDraft {
            items,
            total,
            currency,
            recipient_address: addr.to_string(),
        }),
        _ => Err(errs),
    }
}
