//! Sparse update construction.
//!
//! A key present in the input, even with an empty string, means "set this
//! field"; an absent key means "leave it alone". That distinction is what
//! lets an agent clear a field.

use crate::normalize::{coerce_string, numeric_id};
use serde_json::{Map, Value};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PatchError {
    #[error("update is missing a lead id")]
    MissingIdentifier,
}

/// A sparse update addressed to one row in the store. The id travels next
/// to the field map, never inside it.
#[derive(Clone, Debug, PartialEq)]
pub struct Patch {
    pub id: u64,
    pub fields: Map<String, Value>,
}

fn join_labels(items: &[Value], separator: &str) -> String {
    items
        .iter()
        .map(coerce_string)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Builds the wire patch from proposed field values. Composite fields are
/// flattened to the store's text encodings: `discounts` arrays join with
/// `", "`, `vehicles` arrays join one per line. Strings pass through
/// untouched.
pub fn build_patch(mut fields: Map<String, Value>) -> Result<Patch, PatchError> {
    let id = numeric_id(fields.remove("id").as_ref()).ok_or(PatchError::MissingIdentifier)?;

    if let Some(Value::Array(items)) = fields.get("discounts") {
        let joined = join_labels(items, ", ");
        fields.insert("discounts".to_string(), Value::String(joined));
    }
    if let Some(Value::Array(items)) = fields.get("vehicles") {
        let joined = join_labels(items, "\n");
        fields.insert("vehicles".to_string(), Value::String(joined));
    }

    Ok(Patch { id, fields })
}
