//! JSON Schema validation of summary output (Draft 7).
//!
//! The item summary schema is embedded at compile time from
//! `schemas/item-summary.json` and checked before JSON output is written.
//!
//! # Example
//!
//! ```rust,ignore
//! use bomsummary::validation::validate_item_summary;
//!
//! let value = serde_json::to_value(&summary)?;
//! validate_item_summary(&value).map_err(|errs| errs.join(", "))?;
//! ```

use once_cell::sync::Lazy;
use serde_json::Value;

static ITEM_SUMMARY_SCHEMA: Lazy<Value> = Lazy::new(|| {
    serde_json::from_str(include_str!("../../schemas/item-summary.json")).expect("Invalid embedded schema")
});

/// Validate `data` against `schema`.
///
/// Returns every error message on failure.
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator = jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate one serialized [`crate::models::ItemSummary`].
pub fn validate_item_summary(data: &Value) -> Result<(), Vec<String>> {
    validate(&ITEM_SUMMARY_SCHEMA, data)
}

/// Validate a list of summaries; errors are prefixed with the record index.
pub fn validate_item_summaries(records: &[Value]) -> Result<(), Vec<String>> {
    let errors: Vec<String> = records
        .iter()
        .enumerate()
        .filter_map(|(i, record)| validate_item_summary(record).err().map(|errs| (i, errs)))
        .flat_map(|(i, errs)| errs.into_iter().map(move |e| format!("record {}: {}", i, e)))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTable, ItemSummary};
    use serde_json::json;

    fn summary() -> ItemSummary {
        let mut categories = CategoryTable::default();
        categories.ds.add(3500.0);
        ItemSummary {
            order_name: "TNPR".into(),
            order_number: "1021K457".into(),
            item_id: "1".into(),
            item_name: "FRAME".into(),
            categories,
        }
    }

    #[test]
    fn test_serialized_summary_is_valid() {
        let value = serde_json::to_value(summary()).unwrap();
        assert!(validate_item_summary(&value).is_ok());
    }

    #[test]
    fn test_missing_category_is_invalid() {
        let mut value = serde_json::to_value(summary()).unwrap();
        value["categories"].as_object_mut().unwrap().remove("PD");
        let errors = validate_item_summary(&value).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("PD")));
    }

    #[test]
    fn test_negative_count_is_invalid() {
        let mut value = serde_json::to_value(summary()).unwrap();
        value["categories"]["d"]["count"] = json!(-1);
        let errors = validate_item_summary(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_batch_errors_carry_index() {
        let good = serde_json::to_value(summary()).unwrap();
        let bad = json!({ "itemId": "2" });

        let errors = validate_item_summaries(&[good, bad]).unwrap_err();

        assert!(errors.iter().all(|e| e.starts_with("record 1:")));
    }

    #[test]
    fn test_generic_validate() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        });
        assert!(validate(&schema, &json!({ "name": "test" })).is_ok());
        assert!(validate(&schema, &json!({ "age": 42 })).is_err());
    }
}
