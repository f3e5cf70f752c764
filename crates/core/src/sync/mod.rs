//! Sync/enrichment orchestration

pub mod service;

pub use service::{AppointmentReport, InvoiceReport, SyncService};
