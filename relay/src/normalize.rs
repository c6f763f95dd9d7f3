//! Field normalization for records coming back from the store.
//!
//! The store is a spreadsheet behind a webhook: any field may be absent,
//! null, or the wrong JSON type. Everything here is total over arbitrary
//! input objects, and the policy defaults live here and nowhere else.

use crate::types::{Lead, Worksheet};
use serde_json::{Map, Value};

pub const DEFAULT_COVERAGE: &str = "Full Coverage";
pub const DEFAULT_DEDUCTIBLES: &str = "$500 Comp / $1,000 Collision";

/// String form of a raw JSON value. Numbers and booleans are stringified,
/// anything else counts as absent.
pub(crate) fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn string_field(raw: &Map<String, Value>, key: &str) -> String {
    raw.get(key).map(coerce_string).unwrap_or_default()
}

fn non_blank_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}

/// Single-vehicle display string derived from the legacy triple, skipping
/// blank parts.
pub fn fallback_vehicle(year: &str, make: &str, model: &str) -> String {
    [year, make, model]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Row identifiers arrive as numbers or numeric strings depending on how
/// the sheet serialized them.
pub fn numeric_id(value: Option<&Value>) -> Option<u64> {
    match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Maps a raw store row into the canonical lead shape. Unknown keys are
/// ignored; a row without a usable id gets id 0 and the caller decides
/// whether to keep it.
pub fn normalize_lead(raw: &Map<String, Value>) -> Lead {
    let year = string_field(raw, "year");
    let make = string_field(raw, "make");
    let model = string_field(raw, "model");
    let vehicles = non_blank_or(
        string_field(raw, "vehicles"),
        &fallback_vehicle(&year, &make, &model),
    );

    Lead {
        id: numeric_id(raw.get("id")).unwrap_or(0),
        when: string_field(raw, "when"),
        name: string_field(raw, "name"),
        email: string_field(raw, "email"),
        phone: string_field(raw, "phone"),
        zip: string_field(raw, "zip"),
        dob: string_field(raw, "dob"),
        year,
        make,
        model,
        vehicles,
        status: string_field(raw, "status"),
        agent: string_field(raw, "agent"),
        policy_number: string_field(raw, "policyNumber"),
        coverage: non_blank_or(string_field(raw, "coverage"), DEFAULT_COVERAGE),
        deductibles: non_blank_or(string_field(raw, "deductibles"), DEFAULT_DEDUCTIBLES),
        discounts: string_field(raw, "discounts"),
        renewal_date: string_field(raw, "renewalDate"),
        consent: string_field(raw, "consent"),
    }
}

/// Discounts arrive either as an array or as one comma-separated string.
/// Either way the result is trimmed, non-empty labels in their original
/// order.
pub fn discount_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| coerce_string(item).trim().to_string())
            .filter(|label| !label.is_empty())
            .collect(),
        Some(other) => coerce_string(other)
            .split(',')
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect(),
        None => Vec::new(),
    }
}

/// Maps a raw worksheet object into the canonical shape.
pub fn normalize_worksheet(raw: &Map<String, Value>) -> Worksheet {
    Worksheet {
        coverage_package: string_field(raw, "coveragePackage"),
        liability: string_field(raw, "liability"),
        comp_ded: string_field(raw, "compDed"),
        coll_ded: string_field(raw, "collDed"),
        discounts: discount_list(raw.get("discounts")),
        notes: string_field(raw, "notes"),
    }
}
