//! # Syncline Domain
//!
//! Business domain types for the CRM synchronization pipeline.
//!
//! This crate contains:
//! - Normalized CRM entities (Invoice, Contact, Owner, Appointment, Transaction)
//! - Row projections handed to spreadsheet consumers
//! - Domain error types and Result definitions
//! - Time-window arithmetic and output date formatting
//!
//! ## Architecture
//! - No dependencies on other Syncline crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod errors;
pub mod time;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use time::{format_mdy, month_window, parse_timestamp, year_window, ytd_window, TimeWindow};
pub use types::*;
