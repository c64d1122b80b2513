use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event_type: String,
    pub invoice_id: String,
    pub state: String,
    pub invoice_hash: Option<String>,
    pub tx_hash: Option<String>,
    pub amount: Option<String>,
    pub currency: Option<String>,
    pub recipient: Option<String>,
    pub error: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: &str, invoice_id: &str, state: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event_type: event_type.to_string(),
            invoice_id: invoice_id.to_string(),
            state: state.to_string(),
            invoice_hash: None,
            tx_hash: None,
            amount: None,
            currency: None,
            recipient: None,
            error: None,
        }
    }

    pub fn with_hash(mut self, hash: String) -> Self {
        self.invoice_hash = Some(hash);
        self
    }

    pub fn with_tx_hash(mut self, tx_hash: String) -> Self {
        self.tx_hash = Some(tx_hash);
        self
    }

    pub fn with_payment(mut self, amount: String, currency: String, recipient: String) -> Self {
        self.amount = Some(amount);
        self.currency = Some(currency);
        self.recipient = Some(recipient);
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.error = Some(error);
        self
    }
}

/// Append-only JSON Lines log of payment events.
#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn write(&self, event: &AuditEvent) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(event)?;
        writeln!(file, "{}", json)?;
        tracing::debug!(event_type=%event.event_type, invoice_id=%event.invoice_id, "Audit event written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_line_per_event() {
        let path = std::env::temp_dir().join(format!(
            "mentopay-audit-{}-{}.jsonl",
            std::process::id(),
            Utc::now().timestamp_micros()
        ));
        let log = AuditLog::new(&path);
        log.write(&AuditEvent::new("payment_submitted", "INV-001", "confirming").with_tx_hash("0xab".into()))
            .unwrap();
        log.write(&AuditEvent::new("invoice_paid", "INV-001", "paid")).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: AuditEvent = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.tx_hash.as_deref(), Some("0xab"));
        let _ = std::fs::remove_file(&path);
    }
}
