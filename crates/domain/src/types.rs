//! Normalized data types used throughout the pipeline

pub mod config;
pub mod crm;
pub mod rows;

pub use config::*;
pub use crm::*;
pub use rows::*;
