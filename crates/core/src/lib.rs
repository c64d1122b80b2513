pub mod builder;
pub mod ids;
pub mod models;
pub mod registry;
pub mod units;

pub use builder::{build_invoice, BuildError, DraftItem, InvoiceDraft};
pub use ids::{InvoiceIds, SequentialIds};
pub use models::{Currency, Invoice, InvoiceItem, InvoiceStatus, Network};
