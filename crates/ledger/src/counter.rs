use crate::store::InvoiceStore;
use anyhow::{anyhow, Result};
use mentopay_core::ids::{format_invoice_id, InvoiceIds};

const COUNTERS_TREE: &str = "counters";
const INVOICE_COUNTER_KEY: &str = "invoice";

/// Invoice ids backed by a counter in the invoice store, so numbering
/// carries on across restarts and an id is never handed out twice.
pub struct StoredIds {
    tree: sled::Tree,
}

impl StoredIds {
    /// Opens the counter next to `store`. A store that already holds invoices
    /// but no counter continues after its highest `INV-` number.
    pub fn new(store: &InvoiceStore) -> Result<Self> {
        let tree = store.db().open_tree(COUNTERS_TREE)?;
        if tree.get(INVOICE_COUNTER_KEY)?.is_none() {
            let highest = store
                .list()?
                .iter()
                .filter_map(|inv| inv.id.strip_prefix("INV-"))
                .filter_map(|n| n.parse::<u64>().ok())
                .max()
                .unwrap_or(0);
            tree.insert(INVOICE_COUNTER_KEY, highest.to_be_bytes().to_vec())?;
        }
        Ok(Self { tree })
    }
}

fn increment(old: Option<&[u8]>) -> Option<Vec<u8>> {
    let number = match old {
        Some(bytes) => {
            let array: [u8; 8] = bytes.try_into().unwrap_or([0; 8]);
            u64::from_be_bytes(array) + 1
        }
        None => 1,
    };
    Some(number.to_be_bytes().to_vec())
}

impl InvoiceIds for StoredIds {
    fn next_id(&self) -> Result<String> {
        let bytes = self
            .tree
            .update_and_fetch(INVOICE_COUNTER_KEY, increment)?
            .ok_or_else(|| anyhow!("invoice counter missing after update"))?;
        let array: [u8; 8] = bytes
            .as_ref()
            .try_into()
            .map_err(|_| anyhow!("invoice counter is corrupt"))?;
        self.tree.flush()?;
        Ok(format_invoice_id(u64::from_be_bytes(array)))
    }
}
