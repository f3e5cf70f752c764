//! Tenant configuration loader
//!
//! Loads the multi-tenant roster from a file.
//!
//! ## Loading Strategy
//! 1. `SYNCLINE_TENANTS_PATH` environment variable, when set
//! 2. Otherwise probes `./tenants.{toml,json}` and parent directories
//!
//! Both JSON and TOML are supported, detected by file extension. Every
//! tenant record is validated on load: ids must be non-empty and unique,
//! the declared CRM kind must parse, and the timezone must be a valid IANA
//! name. A bad roster fails the whole load; partially valid rosters are
//! not served.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use syncline_core::CrmKind;
use syncline_domain::{Result, SynclineError, TenantConfig};

const TENANTS_PATH_ENV: &str = "SYNCLINE_TENANTS_PATH";

#[derive(Debug, Deserialize)]
struct TenantsFile {
    tenants: Vec<TenantConfig>,
}

/// Load and validate the tenant roster.
///
/// # Errors
/// Returns `SynclineError::Config` if no roster file is found, the file
/// cannot be parsed, or any tenant record fails validation.
pub fn load_tenants() -> Result<Vec<TenantConfig>> {
    let path = match std::env::var(TENANTS_PATH_ENV) {
        Ok(explicit) => PathBuf::from(explicit),
        Err(_) => probe_tenant_paths().ok_or_else(|| {
            SynclineError::Config(
                "no tenants file found in any of the standard locations".to_string(),
            )
        })?,
    };
    load_tenants_from_file(&path)
}

/// Load and validate the tenant roster from an explicit path.
pub fn load_tenants_from_file(path: &Path) -> Result<Vec<TenantConfig>> {
    if !path.exists() {
        return Err(SynclineError::Config(format!("tenants file not found: {}", path.display())));
    }

    tracing::info!(path = %path.display(), "loading tenant roster");

    let contents = std::fs::read_to_string(path)
        .map_err(|e| SynclineError::Config(format!("failed to read tenants file: {}", e)))?;

    let parsed = parse_tenants(&contents, path)?;
    validate_tenants(&parsed.tenants)?;
    Ok(parsed.tenants)
}

fn parse_tenants(contents: &str, path: &Path) -> Result<TenantsFile> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SynclineError::Config(format!("invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SynclineError::Config(format!("invalid JSON format: {}", e))),
        _ => Err(SynclineError::Config(format!("unsupported tenants format: {}", extension))),
    }
}

fn validate_tenants(tenants: &[TenantConfig]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();

    for tenant in tenants {
        if tenant.id.trim().is_empty() {
            return Err(SynclineError::Config("tenant with empty id".to_string()));
        }
        if !seen.insert(tenant.id.as_str()) {
            return Err(SynclineError::Config(format!("duplicate tenant id: {}", tenant.id)));
        }
        CrmKind::parse(&tenant.crm_kind)
            .map_err(|e| SynclineError::Config(format!("tenant {}: {}", tenant.id, e)))?;
        tenant.tz()?;
    }
    Ok(())
}

/// Probe standard locations for a tenants file.
///
/// Searches `tenants.toml` then `tenants.json` in the current working
/// directory and up to two parent directories, returning the first match.
pub fn probe_tenant_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for prefix in ["", "../", "../../"] {
            candidates.push(cwd.join(format!("{prefix}tenants.toml")));
            candidates.push(cwd.join(format!("{prefix}tenants.json")));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}
