//! Payment-type joiner
//!
//! Second join of the pipeline: invoices × raw payment transactions.
//! Transactions are filtered to succeeded status and the time window,
//! bucketed per invoice id, then every invoice emits one row carrying the
//! latest payment type/detail and the full observed sets.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::debug;

use syncline_domain::{parse_timestamp, Invoice, PaymentTypeRow, TimeWindow, Transaction};

use super::method::derive_payment_method;

/// Payment-type rows plus the canonical header order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentTypeReport {
    pub headers: Vec<&'static str>,
    pub rows: Vec<PaymentTypeRow>,
}

/// Aggregated transactions for one invoice.
#[derive(Debug, Clone)]
struct PaymentBucket {
    types: BTreeSet<String>,
    details: BTreeSet<String>,
    latest_ts: DateTime<Utc>,
    latest_type: String,
    latest_detail: String,
    latest_date: String,
}

impl PaymentBucket {
    fn new(ts: DateTime<Utc>, payment_type: String, detail: String) -> Self {
        let mut bucket = Self {
            types: BTreeSet::new(),
            details: BTreeSet::new(),
            latest_ts: ts,
            latest_type: payment_type.clone(),
            latest_detail: detail.clone(),
            latest_date: ts.format("%m/%d/%Y").to_string(),
        };
        bucket.record_sets(payment_type, detail);
        bucket
    }

    fn observe(&mut self, ts: DateTime<Utc>, payment_type: String, detail: String) {
        // Strictly-later wins; on an exact tie the first transaction seen
        // stays the "latest".
        if ts > self.latest_ts {
            self.latest_ts = ts;
            self.latest_type = payment_type.clone();
            self.latest_detail = detail.clone();
            self.latest_date = ts.format("%m/%d/%Y").to_string();
        }
        self.record_sets(payment_type, detail);
    }

    fn record_sets(&mut self, payment_type: String, detail: String) {
        self.types.insert(payment_type);
        if !detail.is_empty() {
            self.details.insert(detail);
        }
    }

    fn joined_types(&self) -> String {
        join_sorted(&self.types)
    }

    fn joined_details(&self) -> String {
        join_sorted(&self.details)
    }
}

/// Join invoices with their succeeded transactions for the window.
///
/// Invoices with no matching bucket get empty payment fields — that is a
/// valid result, not an error. Output order mirrors invoice input order.
pub fn join_payment_types(
    invoices: &[Invoice],
    transactions: &[Transaction],
    window: TimeWindow,
) -> PaymentTypeReport {
    let buckets = bucket_transactions(transactions, window);

    let rows = invoices
        .iter()
        .map(|invoice| match buckets.get(invoice.id.as_str()) {
            Some(bucket) => PaymentTypeRow::from_invoice(
                invoice,
                (bucket.latest_type.clone(), bucket.latest_detail.clone(), bucket.latest_date.clone()),
                bucket.joined_types(),
                bucket.joined_details(),
            ),
            None => PaymentTypeRow::from_invoice(
                invoice,
                (String::new(), String::new(), String::new()),
                String::new(),
                String::new(),
            ),
        })
        .collect();

    PaymentTypeReport { headers: PaymentTypeRow::HEADERS.to_vec(), rows }
}

/// Bucket transactions per invoice id.
///
/// A transaction survives only if its status is `succeeded`
/// (case-insensitive), it resolves to an invoice id, its effective
/// timestamp parses and falls inside `[start, end)`, and its payment
/// snapshot yields a payment type.
fn bucket_transactions(
    transactions: &[Transaction],
    window: TimeWindow,
) -> HashMap<String, PaymentBucket> {
    let mut buckets: HashMap<String, PaymentBucket> = HashMap::new();

    for tx in transactions {
        if !tx.status.eq_ignore_ascii_case("succeeded") {
            continue;
        }

        let Some(invoice_id) = tx.entity_id.as_deref().filter(|id| !id.is_empty()) else {
            debug!(tx_id = %tx.id, "transaction has no resolvable invoice id, dropping");
            continue;
        };

        let Some(ts) = tx.effective_timestamp().and_then(parse_timestamp) else {
            debug!(tx_id = %tx.id, "transaction has no parseable timestamp, dropping");
            continue;
        };
        if !window.contains(ts) {
            continue;
        }

        let Some((payment_type, detail)) = derive_payment_method(&tx.payment) else {
            debug!(tx_id = %tx.id, "transaction payment snapshot yields no type, dropping");
            continue;
        };

        match buckets.get_mut(invoice_id) {
            Some(bucket) => bucket.observe(ts, payment_type, detail),
            None => {
                buckets.insert(invoice_id.to_string(), PaymentBucket::new(ts, payment_type, detail));
            }
        }
    }

    buckets
}

fn join_sorted(set: &BTreeSet<String>) -> String {
    set.iter().cloned().collect::<Vec<_>>().join(" + ")
}
