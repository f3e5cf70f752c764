//! Concrete CRM connectors and the connector factory

mod highlevel;
mod pagination;

use std::sync::Arc;

use syncline_core::{CrmConnector, CrmKind};
use syncline_domain::{Result, SynclineError, TenantConfig};
use tracing::info;

pub use highlevel::{HighLevelConnector, HighLevelOptions};
pub use pagination::fetch_all_pages;

use crate::cache::EnrichmentCache;

/// Build the connector declared by a tenant's configuration.
///
/// Callers should gate on [`CrmKind::has_connector`] first; asking for a
/// connector for the no-CRM sentinel is a configuration error here.
pub fn build_connector(
    tenant: &TenantConfig,
    cache: Arc<EnrichmentCache>,
) -> Result<Arc<dyn CrmConnector>> {
    let kind = CrmKind::parse(&tenant.crm_kind)?;
    info!(tenant = %tenant.id, %kind, "building crm connector");

    match kind {
        CrmKind::HighLevel => {
            let connector = HighLevelConnector::new(tenant, cache)?;
            Ok(Arc::new(connector))
        }
        CrmKind::Pipedrive => Err(SynclineError::Unsupported(
            "pipedrive is recognized but has no connector implementation yet".into(),
        )),
        CrmKind::None => Err(SynclineError::Config(format!(
            "tenant {} declares no crm backend; check CrmKind::has_connector before building",
            tenant.id
        ))),
    }
}
