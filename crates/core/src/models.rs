use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Mento stable tokens an invoice can be denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Currency {
    #[serde(rename = "cUSD")]
    CUsd,
    #[serde(rename = "cEUR")]
    CEur,
    #[serde(rename = "cREAL")]
    CReal,
}

impl Currency {
    pub fn variants() -> &'static [Currency] {
        &[Currency::CUsd, Currency::CEur, Currency::CReal]
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::CUsd => "cUSD",
            Currency::CEur => "cEUR",
            Currency::CReal => "cREAL",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match Currency::variants().iter().find(|c| c.symbol() == s) {
            Some(c) => Ok(*c),
            None => bail!("unsupported currency: {s}"),
        }
    }
}

/// Celo network an invoice is payable on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    #[serde(alias = "alfajores")]
    Testnet,
}

impl Network {
    pub fn variants() -> &'static [Network] {
        &[Network::Mainnet, Network::Testnet]
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "celo" => Ok(Network::Mainnet),
            "testnet" | "alfajores" => Ok(Network::Testnet),
            other => bail!("unknown network: {other}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    // Reserved; nothing moves an invoice here yet.
    Overdue,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "pending"),
            InvoiceStatus::Paid => write!(f, "paid"),
            InvoiceStatus::Overdue => write!(f, "overdue"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: String,
    pub description: String,
    pub amount: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub items: Vec<InvoiceItem>,
    pub currency: Currency,
    pub total_amount: String,
    pub created_at: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub network: Network,
    pub recipient_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

impl Invoice {
    pub fn is_pending(&self) -> bool {
        self.status == InvoiceStatus::Pending
    }

    /// Record a confirmed payment. Only a pending invoice can become paid, and
    /// the transaction hash is never replaced afterwards.
    pub fn mark_paid(&mut self, tx_hash: impl Into<String>) -> Result<()> {
        if self.status != InvoiceStatus::Pending {
            bail!("invoice {} is {}, not pending", self.id, self.status);
        }
        self.status = InvoiceStatus::Paid;
        self.tx_hash = Some(tx_hash.into());
        Ok(())
    }

    /// Route of the pay page for this invoice.
    pub fn pay_path(&self) -> String {
        format!("/invoice/{}", self.id)
    }

    pub fn pay_link(&self, origin: &str) -> String {
        format!("{}{}", origin.trim_end_matches('/'), self.pay_path())
    }

    pub fn share_text(&self) -> String {
        format!("Payment request for {} {}", self.total_amount, self.currency)
    }

    /// SHA-256 of the invoice's JSON form, hex encoded.
    pub fn digest(&self) -> Result<String> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(hex::encode(hasher.finalize()))
    }
}
