//! # Syncline Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - The HTTP client wrapper (reqwest)
//! - The process-wide TTL enrichment cache
//! - Concrete CRM connectors and the connector factory
//! - The tenant configuration loader
//!
//! ## Architecture
//! - Implements traits defined in `syncline-core`
//! - Contains all "impure" code (network I/O, clocks, environment)

pub mod cache;
pub mod config;
pub mod connectors;
pub mod errors;
pub mod http;

// Re-export commonly used items
pub use cache::EnrichmentCache;
pub use connectors::{build_connector, HighLevelConnector};
pub use errors::InfraError;
pub use http::HttpClient;
