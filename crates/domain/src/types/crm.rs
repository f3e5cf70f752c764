//! Normalized CRM entities
//!
//! Everything here is a transient, request-scoped value object produced by a
//! connector from a backend response. Timestamps stay in whichever string
//! form the backend supplied; normalization to a calendar date happens only
//! at row-formatting time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Partial contact embedded in an invoice listing response.
///
/// May be missing entirely, and any field but `id` may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContactSnapshot {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Invoice as normalized from a backend listing call.
///
/// `amount_paid + amount_due` need not equal `total`; CRMs report partial
/// and adjusted values and this layer performs no reconciliation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub number_prefix: String,
    pub status: String,
    pub amount_paid: f64,
    pub amount_due: f64,
    pub total: f64,
    /// Backend-native issue timestamp; `None` when the CRM omitted it.
    pub issue_date: Option<String>,
    pub due_date: Option<String>,
    pub live_mode: bool,
    pub alt_type: String,
    pub alt_id: String,
    pub company_id: String,
    pub contact: Option<ContactSnapshot>,
}

/// Contact fetched independently of invoices.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Account owner (salesperson) assigned to a contact.
///
/// Empty strings are a valid terminal state: the CRM simply has no
/// assignment for that contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Owner {
    pub id: String,
    pub name: String,
}

impl Owner {
    pub fn is_empty(&self) -> bool {
        self.id.is_empty() && self.name.is_empty()
    }
}

/// Calendar appointment fetched for one team member.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Appointment {
    pub id: String,
    pub title: String,
    /// Raw start time, either ISO-8601 or an epoch-millisecond string.
    pub start_time: String,
    pub status: String,
    pub contact_id: String,
    pub contact_name: String,
    /// Team-member id the event was queried under.
    pub user_id: String,
}

/// Payment transaction settling an invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub id: String,
    /// Invoice this transaction settles; resolved from `entityId` with a
    /// fallback to the nested `entitySource.id` at parse time.
    pub entity_id: Option<String>,
    pub status: String,
    pub fulfilled_at: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Opaque backend payment snapshot; the payment-type joiner probes it.
    #[serde(default)]
    pub payment: Value,
}

impl Transaction {
    /// First non-empty timestamp candidate, in priority order.
    pub fn effective_timestamp(&self) -> Option<&str> {
        [&self.fulfilled_at, &self.created_at, &self.updated_at]
            .into_iter()
            .filter_map(|c| c.as_deref())
            .find(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_is_empty_only_when_both_fields_are_blank() {
        assert!(Owner::default().is_empty());
        assert!(!Owner { id: "o1".into(), name: String::new() }.is_empty());
        assert!(!Owner { id: String::new(), name: "Rep".into() }.is_empty());
        assert!(!Owner { id: "o1".into(), name: "Rep".into() }.is_empty());
    }

    #[test]
    fn effective_timestamp_prefers_fulfilled_at() {
        let tx = Transaction {
            fulfilled_at: Some("2024-01-02T00:00:00Z".into()),
            created_at: Some("2024-01-01T00:00:00Z".into()),
            ..Transaction::default()
        };
        assert_eq!(tx.effective_timestamp(), Some("2024-01-02T00:00:00Z"));
    }

    #[test]
    fn effective_timestamp_skips_empty_candidates() {
        let tx = Transaction {
            fulfilled_at: Some("  ".into()),
            created_at: None,
            updated_at: Some("2024-01-03T00:00:00Z".into()),
            ..Transaction::default()
        };
        assert_eq!(tx.effective_timestamp(), Some("2024-01-03T00:00:00Z"));
    }

    #[test]
    fn effective_timestamp_none_when_all_absent() {
        assert_eq!(Transaction::default().effective_timestamp(), None);
    }
}
