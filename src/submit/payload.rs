//! Form-to-payload mapping.
//!
//! Absent fields are omitted, never sent as `null`. Optional sub-objects
//! with no members are dropped entirely. Role-specific fields are read only
//! for the role currently selected, so leftovers from an earlier choice never
//! leak into the payload.

#[cfg(test)]
#[path = "payload_test.rs"]
mod payload_test;

use serde_json::{Map, Value};

use super::SubmitRequest;
use crate::form::{FormState, FormValue};
use crate::steps::{Flow, FlowKind, Role};

/// Build the request for the flow's endpoint from the accumulated form.
#[must_use]
pub fn build_request(flow: &Flow, form: &FormState) -> SubmitRequest {
    SubmitRequest { flow: flow.kind(), path: flow.endpoint(), payload: build_payload(flow, form) }
}

#[must_use]
pub fn build_payload(flow: &Flow, form: &FormState) -> Value {
    let map = match flow.kind() {
        FlowKind::Registration => registration_payload(form, flow.discriminator(form)),
        FlowKind::Booking => booking_payload(form),
    };
    Value::Object(map)
}

fn registration_payload(form: &FormState, role: Option<Role>) -> Map<String, Value> {
    let mut out = Map::new();
    copy_text(&mut out, form, &["fullName"]);
    put(&mut out, "email", form.text("email").map(|e| Value::String(e.to_ascii_lowercase())));
    put(&mut out, "password", raw_text(form, "password"));
    copy_text(&mut out, form, &["phone", "address", "dateOfBirth", "gender"]);
    put(&mut out, "role", role.map(|r| Value::String(r.as_str().to_owned())));

    match role {
        Some(Role::Patient) => {
            put(
                &mut out,
                "emergencyContact",
                object(form, &[
                    ("name", "emergencyContactName"),
                    ("phone", "emergencyContactPhone"),
                    ("relationship", "emergencyContactRelationship"),
                ]),
            );
            put(
                &mut out,
                "insurance",
                object(form, &[("provider", "insuranceProvider"), ("policyNumber", "insurancePolicyNumber")]),
            );
        }
        Some(Role::Doctor) => {
            copy_text(&mut out, form, &["licenseNumber", "specialization"]);
            put(&mut out, "yearsOfExperience", integer(form, "yearsOfExperience"));
            put(&mut out, "hospital", object(form, &[("name", "hospitalName"), ("address", "hospitalAddress")]));
            put(
                &mut out,
                "bankDetails",
                object(form, &[
                    ("accountName", "bankAccountName"),
                    ("accountNumber", "bankAccountNumber"),
                    ("routingNumber", "bankRoutingNumber"),
                ]),
            );
        }
        Some(Role::Pharmacist) => {
            copy_text(&mut out, form, &["licenseNumber"]);
            put(&mut out, "pharmacy", object(form, &[("name", "pharmacyName"), ("address", "pharmacyAddress")]));
            copy_text(&mut out, form, &["openingHours"]);
        }
        None => {}
    }
    out
}

fn booking_payload(form: &FormState) -> Map<String, Value> {
    let mut out = Map::new();
    copy_text(&mut out, form, &["specialty", "doctorId", "date", "time", "reason", "symptoms"]);
    put(&mut out, "consultationMode", form.text("consultationMode").map(|m| Value::String(m.to_ascii_lowercase())));
    out
}

// =============================================================================
// HELPERS
// =============================================================================

fn put(out: &mut Map<String, Value>, key: &str, value: Option<Value>) {
    if let Some(value) = value {
        out.insert(key.to_owned(), value);
    }
}

fn copy_text(out: &mut Map<String, Value>, form: &FormState, names: &[&str]) {
    for name in names {
        put(out, name, form.text(name).map(Value::String));
    }
}

/// Untrimmed text; passwords are sent exactly as typed.
fn raw_text(form: &FormState, name: &str) -> Option<Value> {
    match form.get(name)? {
        FormValue::Text(s) if !s.trim().is_empty() => Some(Value::String(s.clone())),
        _ => None,
    }
}

fn integer(form: &FormState, name: &str) -> Option<Value> {
    form.text(name)?.parse::<u64>().ok().map(Value::from)
}

/// Nested object from `(payload key, form field)` pairs, or `None` when every member is absent.
fn object(form: &FormState, pairs: &[(&str, &str)]) -> Option<Value> {
    let mut map = Map::new();
    for (key, field) in pairs {
        put(&mut map, key, form.text(field).map(Value::String));
    }
    (!map.is_empty()).then_some(Value::Object(map))
}
