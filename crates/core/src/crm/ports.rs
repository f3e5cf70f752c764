//! CRM connector port interfaces
//!
//! One connector implementation exists per backend CRM; all of them expose
//! the capability set below. Implementations own every backend-specific
//! concern: request shaping, pagination, pacing, and response
//! normalization. Callers only ever see normalized domain entities.

use async_trait::async_trait;
use syncline_domain::{Appointment, Contact, Invoice, Result, SynclineError, TimeWindow, Transaction};

/// Supported CRM backend kinds, parsed from a tenant's declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrmKind {
    /// Primary backend with full capability coverage.
    HighLevel,
    /// Recognized but not yet backed by an implementation.
    Pipedrive,
    /// Sentinel for tenants operating purely on manually uploaded data.
    None,
}

impl CrmKind {
    /// Parse a tenant's declared CRM type string (case-insensitive).
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "highlevel" | "gohighlevel" => Ok(Self::HighLevel),
            "pipedrive" => Ok(Self::Pipedrive),
            "none" | "manual" => Ok(Self::None),
            other => Err(SynclineError::Unsupported(format!("unknown crm type: {other}"))),
        }
    }

    /// Whether this kind is backed by a connector at all.
    ///
    /// `false` only for the no-CRM sentinel; callers must check this
    /// instead of attempting construction and catching the failure.
    pub fn has_connector(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighLevel => "highlevel",
            Self::Pipedrive => "pipedrive",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for CrmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform capability set over CRM backends.
///
/// Failure semantics: fetches surface a single descriptive error wrapping
/// the backend's message and never retry; retry policy belongs to callers.
/// Credential and configuration problems are detected at construction
/// time, not at first use.
#[async_trait]
pub trait CrmConnector: std::fmt::Debug + Send + Sync {
    /// Backend kind this connector talks to.
    fn kind(&self) -> CrmKind;

    /// Invoices whose issue timestamp falls in `[window.start, window.end)`.
    ///
    /// Backends without trustworthy server-side date filtering fetch the
    /// full set and filter client-side; invoices with no parseable issue
    /// date are excluded.
    async fn fetch_invoices(&self, window: TimeWindow) -> Result<Vec<Invoice>>;

    /// Calendar events for each of `user_ids` inside the window.
    ///
    /// Users are iterated sequentially with a pacing pause in between to
    /// respect backend rate limits. When an event carries a contact id but
    /// no contact name, the name is backfilled through the cached contact
    /// lookup, best-effort: a failed lookup leaves the name blank.
    async fn fetch_appointments(
        &self,
        user_ids: &[String],
        window: TimeWindow,
    ) -> Result<Vec<Appointment>>;

    /// One contact, cache-checked first; a miss costs one backend call.
    async fn fetch_contact(&self, contact_id: &str) -> Result<Contact>;

    /// Payment transactions inside the window.
    ///
    /// Optional capability: backends without a transactions endpoint keep
    /// this default and return an empty list. Callers treat "unsupported"
    /// and "no transactions in range" identically.
    async fn fetch_transactions(&self, _window: TimeWindow) -> Result<Vec<Transaction>> {
        Ok(Vec::new())
    }

    /// One lightweight authenticated call; any failure maps to `false`.
    async fn health_check(&self) -> bool;
}
