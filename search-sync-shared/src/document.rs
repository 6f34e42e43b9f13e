//! The flat index-document representation.
//!
//! A document is an ordered field-name to JSON-value map; builders produce
//! one per entity, the repository ships it to the search store unchanged.

use serde::Serialize;
use serde_json::{Map, Value};

/// One completion-suggester entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestEntry {
    pub input: String,
    pub weight: u32,
}

impl SuggestEntry {
    pub fn new(input: impl Into<String>, weight: u32) -> Self {
        Self {
            input: input.into(),
            weight,
        }
    }
}

/// A denormalized search document, keyed by entity id within its index.
///
/// Field order is the underlying map's key order, so serializing the same
/// document twice is byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexDocument {
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl IndexDocument {
    pub fn new() -> Self {
        Self { fields: Map::new() }
    }

    /// Wrap a serialized entity. Returns `None` if the value is not a JSON
    /// object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    /// Insert any serializable value; serialization of these inputs is
    /// infallible for the types builders use.
    pub fn insert_serialized<T: Serialize>(&mut self, key: impl Into<String>, value: &T) {
        if let Ok(value) = serde_json::to_value(value) {
            self.fields.insert(key.into(), value);
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<IndexDocument> for Value {
    fn from(document: IndexDocument) -> Self {
        document.into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(IndexDocument::from_value(json!({"name": "orders"})).is_some());
        assert!(IndexDocument::from_value(json!("orders")).is_none());
        assert!(IndexDocument::from_value(json!([1, 2])).is_none());
    }

    #[test]
    fn test_insert_and_remove() {
        let mut doc = IndexDocument::new();
        doc.insert("deleted", json!(false));
        doc.insert("sampleData", json!({"rows": []}));

        assert!(doc.contains_key("sampleData"));
        doc.remove("sampleData");
        assert!(!doc.contains_key("sampleData"));
        assert_eq!(doc.get("deleted"), Some(&json!(false)));
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let mut doc = IndexDocument::new();
        doc.insert("name", json!("orders"));
        doc.insert("deleted", json!(false));
        doc.insert_serialized("suggest", &vec![SuggestEntry::new("orders", 10)]);

        let first = serde_json::to_vec(&doc).unwrap();
        let second = serde_json::to_vec(&doc.clone()).unwrap();
        assert_eq!(first, second);
    }
}
