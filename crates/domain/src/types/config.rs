//! Tenant configuration structures
//!
//! One `TenantConfig` per isolated customer. These records arrive from the
//! (external) auth/config layer already validated; the loader in the infra
//! crate performs the validation.

use serde::{Deserialize, Serialize};

/// Per-tenant CRM credentials and output preferences.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenantConfig {
    /// Stable tenant identifier; also namespaces cache keys.
    pub id: String,
    /// Declared CRM backend kind (`"highlevel"`, `"pipedrive"`, `"none"`).
    pub crm_kind: String,
    /// Bearer token for the CRM API. Required for any real backend.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Backend-specific account/location identifier.
    #[serde(default)]
    pub location_id: Option<String>,
    /// IANA timezone name used for window boundary math.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Target spreadsheet for the (external) writer.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            crm_kind: String::new(),
            api_token: None,
            location_id: None,
            timezone: default_timezone(),
            spreadsheet_id: None,
        }
    }
}

impl TenantConfig {
    /// Parse the tenant's timezone, falling back to UTC for an empty value.
    pub fn tz(&self) -> Result<chrono_tz::Tz, crate::errors::SynclineError> {
        if self.timezone.trim().is_empty() {
            return Ok(chrono_tz::UTC);
        }
        self.timezone.parse::<chrono_tz::Tz>().map_err(|_| {
            crate::errors::SynclineError::Config(format!(
                "tenant '{}' has invalid timezone '{}'",
                self.id, self.timezone
            ))
        })
    }
}
