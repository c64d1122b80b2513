use anyhow::{Context, Result};
use mentopay_core::models::Invoice;
use sled::Db;
use std::collections::BTreeMap;
use std::path::Path;

const INVOICES_TREE: &str = "invoices";
/// The whole invoice collection lives under this one key.
pub const INVOICES_KEY: &str = "invoices";

type Collection = BTreeMap<String, Invoice>;

/// Persistent invoice storage. Every mutation rewrites the full collection
/// as one JSON document; the last writer wins.
#[derive(Clone)]
pub struct InvoiceStore {
    db: Db,
}

impl InvoiceStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)
            .with_context(|| format!("Failed to open invoice store at {}", path.display()))?;
        Ok(Self { db })
    }

    /// Store that lives only as long as this handle. Used by tests.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &Db {
        &self.db
    }

    fn tree(&self) -> Result<sled::Tree> {
        Ok(self.db.open_tree(INVOICES_TREE)?)
    }

    fn load_all(&self) -> Result<Collection> {
        match self.tree()?.get(INVOICES_KEY)? {
            Some(bytes) => {
                serde_json::from_slice(&bytes).context("Stored invoice collection is corrupt")
            }
            None => Ok(Collection::new()),
        }
    }

    /// Insert or overwrite the invoice with the same id.
    pub fn save(&self, invoice: &Invoice) -> Result<()> {
        let tree = self.tree()?;
        let mut invoices = self.load_all()?;
        invoices.insert(invoice.id.clone(), invoice.clone());
        tree.insert(INVOICES_KEY, serde_json::to_vec(&invoices)?)?;
        tree.flush()?;
        tracing::debug!(invoice_id = %invoice.id, status = %invoice.status, "invoice saved");
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<Option<Invoice>> {
        Ok(self.load_all()?.remove(id))
    }

    /// All invoices, newest first.
    pub fn list(&self) -> Result<Vec<Invoice>> {
        let mut out: Vec<Invoice> = self.load_all()?.into_values().collect();
        out.sort_by_key(|inv| inv.created_at);
        out.reverse();
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use mentopay_core::models::{Currency, InvoiceItem, InvoiceStatus, Network};

    fn invoice(id: &str, minutes: i64) -> Invoice {
        Invoice {
            id: id.to_string(),
            items: vec![InvoiceItem {
                id: "item-1".to_string(),
                description: "Design work".to_string(),
                amount: "100.00".to_string(),
            }],
            currency: Currency::CUsd,
            total_amount: "100.00".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes),
            status: InvoiceStatus::Pending,
            network: Network::Testnet,
            recipient_address: "0x2222222222222222222222222222222222222222".to_string(),
            due_date: None,
            tx_hash: None,
        }
    }

    #[test]
    fn save_then_get_returns_same_record() {
        let store = InvoiceStore::temporary().unwrap();
        let inv = invoice("INV-001", 0);
        store.save(&inv).unwrap();
        assert_eq!(store.get("INV-001").unwrap(), Some(inv));
    }

    #[test]
    fn missing_id_is_none() {
        let store = InvoiceStore::temporary().unwrap();
        assert_eq!(store.get("INV-404").unwrap(), None);
    }

    #[test]
    fn save_overwrites_same_id() {
        let store = InvoiceStore::temporary().unwrap();
        let mut inv = invoice("INV-001", 0);
        store.save(&inv).unwrap();
        inv.mark_paid("0xfeed").unwrap();
        store.save(&inv).unwrap();

        let loaded = store.get("INV-001").unwrap().unwrap();
        assert_eq!(loaded.status, InvoiceStatus::Paid);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn collection_is_one_json_document() {
        let store = InvoiceStore::temporary().unwrap();
        store.save(&invoice("INV-001", 0)).unwrap();
        store.save(&invoice("INV-002", 1)).unwrap();

        let raw = store.tree().unwrap().get(INVOICES_KEY).unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(doc["INV-002"]["totalAmount"], "100.00");
        assert_eq!(doc.as_object().unwrap().len(), 2);
    }

    #[test]
    fn list_is_newest_first() {
        let store = InvoiceStore::temporary().unwrap();
        store.save(&invoice("INV-001", 0)).unwrap();
        store.save(&invoice("INV-002", 5)).unwrap();
        let ids: Vec<String> = store.list().unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["INV-002", "INV-001"]);
    }

    #[test]
    fn survives_reopen() {
        let dir = std::env::temp_dir().join(format!(
            "mentopay-store-{}-{}",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        {
            let store = InvoiceStore::open(&dir).unwrap();
            store.save(&invoice("INV-001", 0)).unwrap();
        }
        let reopened = InvoiceStore::open(&dir).unwrap();
        assert!(reopened.get("INV-001").unwrap().is_some());
        drop(reopened);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
