//! HighLevel CRM connector.
//!
//! Talks to the HighLevel REST API (`services.leadconnectorhq.com`) and
//! normalizes its responses into domain entities. All endpoints are paced
//! sequentially; the API enforces aggressive burst limits per location.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde_json::Value;
use syncline_core::{CrmConnector, CrmKind};
use syncline_domain::{
    parse_timestamp, Appointment, Contact, ContactSnapshot, Invoice, Result, SynclineError,
    TenantConfig, TimeWindow, Transaction,
};
use tracing::{debug, info, warn};

use crate::cache::EnrichmentCache;
use crate::connectors::pagination::fetch_all_pages;
use crate::errors::InfraError;
use crate::http::HttpClient;

const DEFAULT_BASE_URL: &str = "https://services.leadconnectorhq.com";
const API_VERSION: &str = "2021-07-28";
const CONTACT_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Tuning knobs for the HighLevel connector.
///
/// Defaults match production pacing; tests shrink the delays to zero and
/// point `base_url` at a mock server.
#[derive(Debug, Clone)]
pub struct HighLevelOptions {
    pub base_url: String,
    pub page_size: usize,
    /// Pause between consecutive page requests of one listing walk.
    pub page_delay: Duration,
    /// Pause between per-user calendar queries.
    pub user_delay: Duration,
}

impl Default for HighLevelOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: 100,
            page_delay: Duration::from_millis(500),
            user_delay: Duration::from_secs(1),
        }
    }
}

/// Connector for the HighLevel API.
#[derive(Debug)]
pub struct HighLevelConnector {
    http: HttpClient,
    tenant_id: String,
    location_id: String,
    cache: Arc<EnrichmentCache>,
    options: HighLevelOptions,
}

impl HighLevelConnector {
    /// Build a connector for `tenant` with production defaults.
    ///
    /// Fails with a config error when the tenant is missing an API token or
    /// location id; credential problems surface here, not at first fetch.
    pub fn new(tenant: &TenantConfig, cache: Arc<EnrichmentCache>) -> Result<Self> {
        Self::with_options(tenant, cache, HighLevelOptions::default())
    }

    pub fn with_options(
        tenant: &TenantConfig,
        cache: Arc<EnrichmentCache>,
        options: HighLevelOptions,
    ) -> Result<Self> {
        let token = tenant
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SynclineError::Config(format!("tenant {} has no highlevel api token", tenant.id))
            })?;
        let location_id = tenant
            .location_id
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| {
                SynclineError::Config(format!("tenant {} has no highlevel location id", tenant.id))
            })?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SynclineError::Config("api token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert("Version", HeaderValue::from_static(API_VERSION));

        let http = HttpClient::builder()
            .user_agent("syncline/0.1")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            tenant_id: tenant.id.clone(),
            location_id: location_id.to_string(),
            cache,
            options,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.options.base_url, path)
    }

    fn contact_cache_key(&self, contact_id: &str) -> String {
        format!("{}:contact:{}", self.tenant_id, contact_id)
    }

    /// Issue a GET and decode the JSON body, mapping non-2xx statuses into
    /// domain errors.
    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let request = self.http.request(Method::GET, self.url(path)).query(query);
        let response = self.http.send(request).await?;
        let response = response.error_for_status().map_err(|err| {
            let infra: InfraError = err.into();
            SynclineError::from(infra)
        })?;
        let body = response.json::<Value>().await.map_err(|err| {
            let infra: InfraError = err.into();
            SynclineError::from(infra)
        })?;
        Ok(body)
    }

    async fn fetch_listing(
        &self,
        path: &str,
        items_field: &str,
        extra_query: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        let page_size = self.options.page_size;
        fetch_all_pages(page_size, self.options.page_delay, |offset| {
            let mut query: Vec<(&str, String)> = vec![
                ("altId", self.location_id.clone()),
                ("altType", "location".to_string()),
                ("limit", page_size.to_string()),
                ("offset", offset.to_string()),
            ];
            query.extend(extra_query.iter().cloned());
            async move {
                let body = self.get_json(path, &query).await?;
                Ok(array_field(&body, items_field))
            }
        })
        .await
    }
}

#[async_trait]
impl CrmConnector for HighLevelConnector {
    fn kind(&self) -> CrmKind {
        CrmKind::HighLevel
    }

    async fn fetch_invoices(&self, window: TimeWindow) -> Result<Vec<Invoice>> {
        let items = self.fetch_listing("/invoices/", "invoices", &[]).await?;
        let total = items.len();

        // The listing endpoint has no trustworthy date filter, so the window
        // is applied client-side on the parsed issue timestamp.
        let invoices: Vec<Invoice> = items
            .iter()
            .map(parse_invoice)
            .filter(|invoice| {
                invoice
                    .issue_date
                    .as_deref()
                    .and_then(parse_timestamp)
                    .is_some_and(|ts| window.contains(ts))
            })
            .collect();

        info!(
            tenant = %self.tenant_id,
            fetched = total,
            in_window = invoices.len(),
            "fetched invoices"
        );
        Ok(invoices)
    }

    async fn fetch_appointments(
        &self,
        user_ids: &[String],
        window: TimeWindow,
    ) -> Result<Vec<Appointment>> {
        let start_ms = window.start.timestamp_millis().to_string();
        let end_ms = window.end.timestamp_millis().to_string();

        let mut appointments = Vec::new();
        for (index, user_id) in user_ids.iter().enumerate() {
            let query = vec![
                ("locationId", self.location_id.clone()),
                ("userId", user_id.clone()),
                ("startTime", start_ms.clone()),
                ("endTime", end_ms.clone()),
            ];
            let body = self.get_json("/calendars/events", &query).await?;
            let events = array_field(&body, "events");
            debug!(tenant = %self.tenant_id, user_id = %user_id, events = events.len(), "fetched calendar events");

            for event in &events {
                appointments.push(parse_appointment(event, user_id));
            }

            if index + 1 < user_ids.len() && !self.options.user_delay.is_zero() {
                tokio::time::sleep(self.options.user_delay).await;
            }
        }

        // Backfill missing contact names through the cached lookup. A failed
        // lookup leaves the name blank rather than failing the batch.
        for appointment in &mut appointments {
            if appointment.contact_name.is_empty() && !appointment.contact_id.is_empty() {
                match self.fetch_contact(&appointment.contact_id).await {
                    Ok(contact) => appointment.contact_name = contact.name,
                    Err(err) => {
                        warn!(
                            tenant = %self.tenant_id,
                            contact_id = %appointment.contact_id,
                            error = %err,
                            "contact name backfill failed"
                        );
                    }
                }
            }
        }

        Ok(appointments)
    }

    async fn fetch_contact(&self, contact_id: &str) -> Result<Contact> {
        let key = self.contact_cache_key(contact_id);
        if let Some(contact) = self.cache.get_as::<Contact>(&key) {
            return Ok(contact);
        }

        let body = self.get_json(&format!("/contacts/{contact_id}"), &[]).await?;
        let raw = body.get("contact").unwrap_or(&body);
        let contact = parse_contact(raw, contact_id);

        if let Ok(value) = serde_json::to_value(&contact) {
            self.cache.set(key, value, Some(CONTACT_CACHE_TTL));
        }
        Ok(contact)
    }

    async fn fetch_transactions(&self, window: TimeWindow) -> Result<Vec<Transaction>> {
        // startAt/endAt narrow the listing server-side, but the payment-type
        // joiner re-filters on the effective timestamp regardless.
        let extra = vec![
            ("startAt", window.start.timestamp_millis().to_string()),
            ("endAt", window.end.timestamp_millis().to_string()),
        ];
        let items = self.fetch_listing("/payments/transactions", "data", &extra).await?;
        let transactions: Vec<Transaction> = items.iter().map(parse_transaction).collect();

        info!(tenant = %self.tenant_id, count = transactions.len(), "fetched transactions");
        Ok(transactions)
    }

    async fn health_check(&self) -> bool {
        let probe = async {
            let request = self
                .http
                .request(Method::GET, self.url(&format!("/locations/{}", self.location_id)))
                .timeout(HEALTH_CHECK_TIMEOUT);
            let response = self.http.send(request).await?;
            Ok::<bool, SynclineError>(response.status().is_success())
        };

        match probe.await {
            Ok(healthy) => healthy,
            Err(err) => {
                warn!(tenant = %self.tenant_id, error = %err, "health check failed");
                false
            }
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Response parsing */
/* -------------------------------------------------------------------------- */

fn array_field(body: &Value, field: &str) -> Vec<Value> {
    body.get(field).and_then(Value::as_array).cloned().unwrap_or_default()
}

fn str_field(value: &Value, field: &str) -> String {
    value.get(field).and_then(Value::as_str).unwrap_or_default().to_string()
}

fn opt_str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn num_field(value: &Value, field: &str) -> f64 {
    match value.get(field) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Entity id keyed as `_id` in most HighLevel payloads, `id` in some.
fn id_field(value: &Value) -> String {
    let primary = str_field(value, "_id");
    if primary.is_empty() { str_field(value, "id") } else { primary }
}

fn parse_invoice(raw: &Value) -> Invoice {
    let contact = raw.get("contactDetails").and_then(|details| {
        let id = id_field(details);
        if id.is_empty() {
            return None;
        }
        Some(ContactSnapshot {
            id,
            name: opt_str_field(details, "name"),
            email: opt_str_field(details, "email"),
            phone: opt_str_field(details, "phoneNo"),
        })
    });

    Invoice {
        id: id_field(raw),
        invoice_number: str_field(raw, "invoiceNumber"),
        number_prefix: str_field(raw, "invoiceNumberPrefix"),
        status: str_field(raw, "status"),
        amount_paid: num_field(raw, "amountPaid"),
        amount_due: num_field(raw, "amountDue"),
        total: num_field(raw, "total"),
        issue_date: opt_str_field(raw, "issueDate"),
        due_date: opt_str_field(raw, "dueDate"),
        live_mode: raw.get("liveMode").and_then(Value::as_bool).unwrap_or_default(),
        alt_type: str_field(raw, "altType"),
        alt_id: str_field(raw, "altId"),
        company_id: str_field(raw, "companyId"),
        contact,
    }
}

fn parse_appointment(raw: &Value, user_id: &str) -> Appointment {
    Appointment {
        id: id_field(raw),
        title: str_field(raw, "title"),
        start_time: match raw.get("startTime") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        },
        status: str_field(raw, "appointmentStatus"),
        contact_id: str_field(raw, "contactId"),
        contact_name: str_field(raw, "contactName"),
        user_id: user_id.to_string(),
    }
}

/// Owner assignment is inconsistent across HighLevel accounts: some expose a
/// flat `ownerId`/`ownerName` pair, some a nested `owner` object, and legacy
/// accounts only `assignedTo`.
fn parse_contact(raw: &Value, contact_id: &str) -> Contact {
    let name = {
        let full = str_field(raw, "name");
        if !full.is_empty() {
            full
        } else {
            let first = str_field(raw, "firstName");
            let last = str_field(raw, "lastName");
            [first, last].iter().filter(|s| !s.is_empty()).cloned().collect::<Vec<_>>().join(" ")
        }
    };

    let (owner_id, owner_name) = if let Some(id) = opt_str_field(raw, "ownerId") {
        (Some(id), opt_str_field(raw, "ownerName"))
    } else if let Some(owner) = raw.get("owner").filter(|o| o.is_object()) {
        (opt_str_field(owner, "id"), opt_str_field(owner, "name"))
    } else if let Some(assigned) = opt_str_field(raw, "assignedTo") {
        (Some(assigned), None)
    } else {
        (None, None)
    };

    let id = {
        let parsed = id_field(raw);
        if parsed.is_empty() { contact_id.to_string() } else { parsed }
    };

    Contact {
        id,
        name,
        email: str_field(raw, "email"),
        phone: str_field(raw, "phone"),
        owner_id,
        owner_name,
        address: opt_str_field(raw, "address1"),
    }
}

fn parse_transaction(raw: &Value) -> Transaction {
    let entity_id = opt_str_field(raw, "entityId")
        .or_else(|| raw.get("entitySource").and_then(|source| opt_str_field(source, "id")));

    Transaction {
        id: id_field(raw),
        entity_id,
        status: str_field(raw, "status"),
        fulfilled_at: opt_str_field(raw, "fulfilledAt"),
        created_at: opt_str_field(raw, "createdAt"),
        updated_at: opt_str_field(raw, "updatedAt"),
        payment: raw.clone(),
    }
}
