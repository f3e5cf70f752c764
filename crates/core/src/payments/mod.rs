//! Payment-type join: invoices × payment transactions

pub mod joiner;
pub mod method;

pub use joiner::{join_payment_types, PaymentTypeReport};
pub use method::derive_payment_method;
