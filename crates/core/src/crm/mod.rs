//! CRM connector port definitions

pub mod ports;

pub use ports::{CrmConnector, CrmKind};
