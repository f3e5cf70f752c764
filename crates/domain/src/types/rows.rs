//! Row projections handed to spreadsheet consumers
//!
//! Rows are the only shape this pipeline ever exports: flat, ordered,
//! string/number-only. Construction is pure and total — every missing
//! source field has a defined fallback (empty string or zero) and no row
//! constructor can fail on malformed input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::format_mdy;
use crate::types::crm::{Appointment, Invoice, Owner};

/// A single output cell: text or number, nothing else.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(f64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// Invoice row enriched with account-owner data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InvoiceRow {
    pub invoice_id: String,
    pub invoice_number: String,
    pub status: String,
    pub issue_date: String,
    pub due_date: String,
    pub amount_paid: f64,
    pub amount_due: f64,
    pub amount_total: f64,
    pub live_mode: String,
    pub contact_id: String,
    pub contact_name: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub owner_id: String,
    pub owner_name: String,
    pub alt_type: String,
    pub alt_id: String,
    pub company_id: String,
}

impl InvoiceRow {
    /// Canonical header order for invoice output.
    pub const HEADERS: [&'static str; 18] = [
        "Invoice ID",
        "Invoice Number",
        "Status",
        "Issue Date",
        "Due Date",
        "Amount Paid",
        "Amount Due",
        "Amount Total",
        "Live Mode",
        "Contact ID",
        "Contact Name",
        "Contact Email",
        "Contact Phone",
        "Owner ID",
        "Owner Name",
        "Alt Type",
        "Alt ID",
        "Company ID",
    ];

    /// Build a row from an invoice and its resolved owner.
    pub fn from_invoice(invoice: &Invoice, owner: &Owner) -> Self {
        let contact = invoice.contact.clone().unwrap_or_default();
        Self {
            invoice_id: invoice.id.clone(),
            invoice_number: display_number(&invoice.number_prefix, &invoice.invoice_number),
            status: invoice.status.clone(),
            issue_date: format_mdy(invoice.issue_date.as_deref().unwrap_or_default()),
            due_date: format_mdy(invoice.due_date.as_deref().unwrap_or_default()),
            amount_paid: invoice.amount_paid,
            amount_due: invoice.amount_due,
            amount_total: invoice.total,
            live_mode: if invoice.live_mode { "true".into() } else { "false".into() },
            contact_id: contact.id,
            contact_name: contact.name.unwrap_or_default(),
            contact_email: contact.email.unwrap_or_default(),
            contact_phone: contact.phone.unwrap_or_default(),
            owner_id: owner.id.clone(),
            owner_name: owner.name.clone(),
            alt_type: invoice.alt_type.clone(),
            alt_id: invoice.alt_id.clone(),
            company_id: invoice.company_id.clone(),
        }
    }

    /// Ordered cells matching [`Self::HEADERS`].
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            self.invoice_id.clone().into(),
            self.invoice_number.clone().into(),
            self.status.clone().into(),
            self.issue_date.clone().into(),
            self.due_date.clone().into(),
            self.amount_paid.into(),
            self.amount_due.into(),
            self.amount_total.into(),
            self.live_mode.clone().into(),
            self.contact_id.clone().into(),
            self.contact_name.clone().into(),
            self.contact_email.clone().into(),
            self.contact_phone.clone().into(),
            self.owner_id.clone().into(),
            self.owner_name.clone().into(),
            self.alt_type.clone().into(),
            self.alt_id.clone().into(),
            self.company_id.clone().into(),
        ]
    }
}

/// Appointment row for one calendar event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentRow {
    pub appointment_id: String,
    pub title: String,
    pub start_date: String,
    pub status: String,
    pub contact_id: String,
    pub contact_name: String,
    pub user_id: String,
}

impl AppointmentRow {
    /// Canonical header order for appointment output.
    pub const HEADERS: [&'static str; 7] = [
        "Appointment ID",
        "Title",
        "Start Date",
        "Status",
        "Contact ID",
        "Contact Name",
        "User ID",
    ];

    pub fn from_appointment(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id.clone(),
            title: appointment.title.clone(),
            start_date: format_mdy(&appointment.start_time),
            status: appointment.status.clone(),
            contact_id: appointment.contact_id.clone(),
            contact_name: appointment.contact_name.clone(),
            user_id: appointment.user_id.clone(),
        }
    }

    /// Ordered cells matching [`Self::HEADERS`].
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            self.appointment_id.clone().into(),
            self.title.clone().into(),
            self.start_date.clone().into(),
            self.status.clone().into(),
            self.contact_id.clone().into(),
            self.contact_name.clone().into(),
            self.user_id.clone().into(),
        ]
    }
}

/// Invoice row carrying derived payment-method data.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaymentTypeRow {
    pub invoice_id: String,
    pub invoice_number: String,
    pub status: String,
    pub issue_date: String,
    pub amount_total: f64,
    /// Latest (by transaction timestamp) payment type.
    pub payment_type: String,
    pub payment_detail: String,
    pub payment_date: String,
    /// Alphabetically sorted, `" + "`-joined distinct types.
    pub all_payment_types: String,
    pub all_payment_details: String,
}

impl PaymentTypeRow {
    /// Canonical header order for payment-type output.
    pub const HEADERS: [&'static str; 10] = [
        "Invoice ID",
        "Invoice Number",
        "Status",
        "Issue Date",
        "Amount Total",
        "Payment Type",
        "Payment Detail",
        "Payment Date",
        "All Payment Types",
        "All Payment Details",
    ];

    /// Build a row from an invoice and its (possibly absent) payment bucket.
    ///
    /// `latest` is `(type, detail, date)`; empty strings when no succeeded
    /// transaction matched the invoice — that is not an error.
    pub fn from_invoice(
        invoice: &Invoice,
        latest: (String, String, String),
        all_types: String,
        all_details: String,
    ) -> Self {
        let (payment_type, payment_detail, payment_date) = latest;
        Self {
            invoice_id: invoice.id.clone(),
            invoice_number: display_number(&invoice.number_prefix, &invoice.invoice_number),
            status: invoice.status.clone(),
            issue_date: format_mdy(invoice.issue_date.as_deref().unwrap_or_default()),
            amount_total: invoice.total,
            payment_type,
            payment_detail,
            payment_date,
            all_payment_types: all_types,
            all_payment_details: all_details,
        }
    }

    /// Ordered cells matching [`Self::HEADERS`].
    pub fn cells(&self) -> Vec<Cell> {
        vec![
            self.invoice_id.clone().into(),
            self.invoice_number.clone().into(),
            self.status.clone().into(),
            self.issue_date.clone().into(),
            self.amount_total.into(),
            self.payment_type.clone().into(),
            self.payment_detail.clone().into(),
            self.payment_date.clone().into(),
            self.all_payment_types.clone().into(),
            self.all_payment_details.clone().into(),
        ]
    }
}

/// Join a display prefix and invoice number, tolerating either side missing.
fn display_number(prefix: &str, number: &str) -> String {
    match (prefix.is_empty(), number.is_empty()) {
        (true, _) => number.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}{number}"),
    }
}
