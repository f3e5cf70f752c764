//! Tenant configuration loading

mod loader;

pub use loader::{load_tenants, load_tenants_from_file, probe_tenant_paths};
