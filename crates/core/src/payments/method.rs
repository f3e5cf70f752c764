//! Payment method derivation
//!
//! Each transaction carries an opaque backend payment snapshot. The probes
//! below turn it into a normalized `(type, detail)` pair, in priority
//! order:
//!
//! 1. Explicit manual payment mode (check, cash, ...), with the check
//!    number as detail. `"cheque"` and `"check"` normalize to the same
//!    type.
//! 2. Nested card charge snapshot: payment method type plus a brand/last-4
//!    detail.
//! 3. Generic `paymentMethodType` field, no detail.
//!
//! A snapshot yielding none of these contributes nothing to aggregation.

use serde_json::Value;

/// Derive the normalized payment type and human-readable detail.
///
/// Returns `None` when no probe resolves a type; such transactions are
/// dropped from aggregation entirely.
pub fn derive_payment_method(payment: &Value) -> Option<(String, String)> {
    if let Some(mode) = non_empty_str(&payment["manualPaymentMode"]) {
        let detail = field_as_string(&payment["checkNumber"]);
        return Some((normalize_type(mode), detail));
    }

    let charge = &payment["chargeSnapshot"];
    if charge.is_object() {
        let details = &charge["payment_method_details"];
        let method_type = non_empty_str(&details["type"]).map(normalize_type);
        let card = &details["card"];
        let brand = non_empty_str(&card["brand"]).unwrap_or_default();
        let last4 = non_empty_str(&card["last4"]).unwrap_or_default();
        let detail = [brand, last4].iter().filter(|s| !s.is_empty()).cloned().collect::<Vec<_>>().join(" ");

        if let Some(method_type) = method_type {
            return Some((method_type, detail));
        }
        if !detail.is_empty() {
            // A card block with no explicit type is still a card payment.
            return Some(("card".to_string(), detail));
        }
    }

    non_empty_str(&payment["paymentMethodType"])
        .map(|t| (normalize_type(t), String::new()))
}

/// Lowercase the type and collapse spelling variants.
fn normalize_type(raw: String) -> String {
    let lowered = raw.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "cheque" => "check".to_string(),
        _ => lowered,
    }
}

fn non_empty_str(value: &Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// String or number field rendered as text; anything else is empty.
fn field_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}
