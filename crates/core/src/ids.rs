use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Source of invoice identifiers. Each call hands out a new id.
pub trait InvoiceIds: Send + Sync {
    fn next_id(&self) -> Result<String>;
}

pub fn format_invoice_id(counter: u64) -> String {
    format!("INV-{counter:03}")
}

/// In-memory counter. Ids restart when the process does.
#[derive(Debug)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceIds for SequentialIds {
    fn next_id(&self) -> Result<String> {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Ok(format_invoice_id(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one() {
        let ids = SequentialIds::new();
        assert_eq!(ids.next_id().unwrap(), "INV-001");
        assert_eq!(ids.next_id().unwrap(), "INV-002");
    }

    #[test]
    fn padding_grows_past_three_digits() {
        assert_eq!(format_invoice_id(999), "INV-999");
        assert_eq!(format_invoice_id(1000), "INV-1000");
    }
}
