//! API endpoint handlers.

pub mod health;
pub mod history;
pub mod medication_info;
pub mod predict;

use serde_json::Value;

use crate::api::error::ApiError;
use crate::models::MedicationRecord;

/// Client-facing messages for validating a list of medication records.
pub(crate) struct ListMessages {
    pub field: &'static str,
    pub missing: &'static str,
    pub not_list: &'static str,
    pub not_object: &'static str,
    pub missing_name: &'static str,
}

/// A validated medication list: the entries as sent plus their typed form.
#[derive(Debug)]
pub(crate) struct ParsedMedications {
    pub raw: Vec<Value>,
    pub records: Vec<MedicationRecord>,
}

/// Pull `messages.field` out of a JSON body as medication records.
pub(crate) fn parse_medication_list(
    body: &Value,
    messages: &ListMessages,
) -> Result<ParsedMedications, ApiError> {
    let raw = body
        .get(messages.field)
        .ok_or_else(|| ApiError::BadRequest(messages.missing.into()))?;
    let items = raw
        .as_array()
        .ok_or_else(|| ApiError::BadRequest(messages.not_list.into()))?;

    let records = items
        .iter()
        .map(|item| {
            let entry = item
                .as_object()
                .ok_or_else(|| ApiError::BadRequest(messages.not_object.into()))?;
            if !entry.get("name").is_some_and(Value::is_string) {
                return Err(ApiError::BadRequest(messages.missing_name.into()));
            }
            serde_json::from_value(item.clone())
                .map_err(|e| ApiError::BadRequest(format!("Invalid medication entry: {e}")))
        })
        .collect::<Result<Vec<MedicationRecord>, ApiError>>()?;

    Ok(ParsedMedications {
        raw: items.clone(),
        records,
    })
}
