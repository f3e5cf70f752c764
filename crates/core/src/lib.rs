//! # Syncline Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The CRM connector port (trait) and backend kind registry
//! - The sync/enrichment service (invoices × owners)
//! - The payment-type joiner (invoices × transactions)
//!
//! ## Architecture Principles
//! - Only depends on `syncline-domain`
//! - No HTTP or platform code; all external dependencies via traits
//! - Pure, testable business logic

pub mod crm;
pub mod payments;
pub mod sync;

// Re-export specific items to avoid ambiguity
pub use crm::ports::{CrmConnector, CrmKind};
pub use payments::{derive_payment_method, join_payment_types, PaymentTypeReport};
pub use sync::{AppointmentReport, InvoiceReport, SyncService};
