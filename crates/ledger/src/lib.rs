mod audit;
pub mod counter;
pub mod payment;
pub mod store;

pub use audit::{AuditEvent, AuditLog};
pub use counter::StoredIds;
pub use payment::{
    LogObserver, Notice, PaymentError, PaymentExecutor, PaymentObserver, PaymentOutcome,
    PaymentState,
};
pub use store::InvoiceStore;
