//! Food waste entry types
//!
//! Request bodies are taken as-is. Field values keep whatever JSON type the
//! caller sent and the store decides what to do with them. A field that is
//! missing from the body is distinct from one that is `null`: `null` binds as
//! NULL, a missing field cannot be bound at all.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;

/// Label used in messages when a request omits the category.
pub const MISSING_CATEGORY: &str = "undefined";

/// Food waste entry record from the store
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct FoodWasteEntry {
    pub id: i64,
    pub category: Option<String>,
    pub weight: Option<f64>,
    pub waste_reason: Option<String>,
}

/// Body of create and update requests
///
/// `None` means the field was absent; `Some(Value::Null)` means it was `null`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EntryBody {
    #[serde(default, deserialize_with = "present")]
    pub category: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub weight: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub waste_reason: Option<Value>,
}

fn required<'a>(value: &'a Option<Value>, field: &'static str) -> Result<&'a Value, MissingField> {
    value.as_ref().ok_or(MissingField { field })
}

/// Keeps an explicit `null` as `Some(Value::Null)` instead of collapsing it to `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A body field that was never sent and so has nothing to bind
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("bind parameter `{field}` is undefined")]
pub struct MissingField {
    pub field: &'static str,
}

impl EntryBody {
    /// Build a body from values that are all present.
    pub fn new(category: Value, weight: Value, waste_reason: Value) -> Self {
        Self {
            category: Some(category),
            weight: Some(weight),
            waste_reason: Some(waste_reason),
        }
    }

    /// The three values in column order, or the first one that is missing.
    pub fn values(&self) -> Result<[&Value; 3], MissingField> {
        Ok([
            required(&self.category, "category")?,
            required(&self.weight, "weight")?,
            required(&self.waste_reason, "waste_reason")?,
        ])
    }

    /// Category as it appears in response messages.
    pub fn category_label(&self) -> String {
        match &self.category {
            None => MISSING_CATEGORY.to_string(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_null_are_distinct() {
        let body: EntryBody =
            serde_json::from_str(r#"{"category":"dairy","weight":null}"#).unwrap();
        assert_eq!(body.category, Some(json!("dairy")));
        assert_eq!(body.weight, Some(Value::Null));
        assert_eq!(body.waste_reason, None);
        assert_eq!(body.values(), Err(MissingField { field: "waste_reason" }));
    }

    #[test]
    fn values_keep_their_json_type() {
        let body: EntryBody =
            serde_json::from_str(r#"{"category":5,"weight":"2.5","waste_reason":true}"#).unwrap();
        let [category, weight, reason] = body.values().unwrap();
        assert_eq!(category, &json!(5));
        assert_eq!(weight, &json!("2.5"));
        assert_eq!(reason, &json!(true));
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let body: EntryBody =
            serde_json::from_str(r#"{"category":"bread","weight":0.4,"colour":"brown"}"#).unwrap();
        assert_eq!(body.weight, Some(json!(0.4)));
    }

    #[test]
    fn category_labels() {
        assert_eq!(EntryBody::default().category_label(), "undefined");
        let label = |v: Value| EntryBody::new(v, json!(1), json!("x")).category_label();
        assert_eq!(label(json!("dairy")), "dairy");
        assert_eq!(label(json!(5)), "5");
        assert_eq!(label(Value::Null), "null");
    }

    #[test]
    fn entry_serializes_nulls() {
        let entry = FoodWasteEntry {
            id: 7,
            category: None,
            weight: Some(1.5),
            waste_reason: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "category": null, "weight": 1.5, "waste_reason": null})
        );
    }
}
