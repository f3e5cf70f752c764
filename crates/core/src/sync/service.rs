//! Sync/enrichment service
//!
//! Orchestrates one sync request: fetch invoices for a window, resolve the
//! account owner for every referenced contact through the connector's
//! cached lookup, and join owner data back onto each invoice. Output row
//! order mirrors input fetch order (stable join).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use syncline_domain::{
    AppointmentRow, Invoice, InvoiceRow, Owner, Result, TimeWindow,
};

use crate::crm::ports::CrmConnector;

/// Pause inserted after every [`LOOKUP_BATCH_SIZE`] contact lookups.
const LOOKUP_PAUSE: Duration = Duration::from_secs(1);

/// Owner lookups issued between pacing pauses.
const LOOKUP_BATCH_SIZE: usize = 25;

/// Invoice rows plus the canonical header order.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceReport {
    pub headers: Vec<&'static str>,
    pub rows: Vec<InvoiceRow>,
}

/// Appointment rows plus the canonical header order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppointmentReport {
    pub headers: Vec<&'static str>,
    pub rows: Vec<AppointmentRow>,
}

/// Drives a connector through one sync request.
pub struct SyncService {
    connector: Arc<dyn CrmConnector>,
    lookup_batch_size: usize,
    lookup_pause: Duration,
}

impl SyncService {
    pub fn new(connector: Arc<dyn CrmConnector>) -> Self {
        Self { connector, lookup_batch_size: LOOKUP_BATCH_SIZE, lookup_pause: LOOKUP_PAUSE }
    }

    /// Override pacing, for tests and for tenants with laxer rate limits.
    pub fn with_pacing(
        connector: Arc<dyn CrmConnector>,
        lookup_batch_size: usize,
        lookup_pause: Duration,
    ) -> Self {
        Self { connector, lookup_batch_size: lookup_batch_size.max(1), lookup_pause }
    }

    /// Fetch invoices for the window and enrich each with its account owner.
    pub async fn sync_invoices(&self, window: TimeWindow) -> Result<InvoiceReport> {
        let invoices = self.connector.fetch_invoices(window).await?;
        info!(crm = %self.connector.kind(), count = invoices.len(), "fetched invoices");

        let contact_ids = distinct_contact_ids(&invoices);
        let owners = self.build_owner_lookup(&contact_ids).await;

        let empty = Owner::default();
        let rows = invoices
            .iter()
            .map(|invoice| {
                let owner = invoice
                    .contact
                    .as_ref()
                    .and_then(|c| owners.get(c.id.as_str()))
                    .unwrap_or(&empty);
                InvoiceRow::from_invoice(invoice, owner)
            })
            .collect();

        Ok(InvoiceReport { headers: InvoiceRow::HEADERS.to_vec(), rows })
    }

    /// Resolve an owner per distinct contact id, sequentially.
    ///
    /// A failed lookup records an empty owner and continues; one bad
    /// contact never aborts the batch. Pauses after every
    /// `lookup_batch_size` lookups to stay under backend rate limits.
    pub async fn build_owner_lookup(&self, contact_ids: &[String]) -> HashMap<String, Owner> {
        let mut owners = HashMap::with_capacity(contact_ids.len());

        for (index, contact_id) in contact_ids.iter().enumerate() {
            let owner = match self.connector.fetch_contact(contact_id).await {
                Ok(contact) => Owner {
                    id: contact.owner_id.unwrap_or_default(),
                    name: contact.owner_name.unwrap_or_default(),
                },
                Err(e) => {
                    warn!(contact_id = %contact_id, error = %e, "owner lookup failed, recording empty owner");
                    Owner::default()
                }
            };
            if owner.is_empty() {
                debug!(contact_id = %contact_id, "contact resolved with no owner assignment");
            }
            owners.insert(contact_id.clone(), owner);

            let resolved = index + 1;
            if resolved % self.lookup_batch_size == 0 && resolved < contact_ids.len() {
                debug!(resolved, "pausing owner lookups for rate limit");
                tokio::time::sleep(self.lookup_pause).await;
            }
        }

        owners
    }

    /// Fetch appointments for a set of team members and project them to rows.
    pub async fn sync_appointments(
        &self,
        user_ids: &[String],
        window: TimeWindow,
    ) -> Result<AppointmentReport> {
        let appointments = self.connector.fetch_appointments(user_ids, window).await?;
        info!(crm = %self.connector.kind(), count = appointments.len(), "fetched appointments");

        let rows = appointments.iter().map(AppointmentRow::from_appointment).collect();
        Ok(AppointmentReport { headers: AppointmentRow::HEADERS.to_vec(), rows })
    }
}

/// Distinct contact ids referenced by embedded snapshots, first-seen order.
fn distinct_contact_ids(invoices: &[Invoice]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for invoice in invoices {
        if let Some(contact) = &invoice.contact {
            if !contact.id.is_empty() && seen.insert(contact.id.clone()) {
                ids.push(contact.id.clone());
            }
        }
    }
    ids
}
