//! Raw field maps exchanged with storage backends.
//!
//! Storage enforces no schema: a field map is a flat, insertion-ordered
//! mapping from field name to a raw value. Decoding structured values out of
//! those raw values is the job of the form layer above storage.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A raw field value: a string or a structured scalar.
pub type FieldValue = Value;

/// Insertion-ordered map from field name to raw value.
///
/// Equality is order-sensitive: two maps are equal only if they hold the
/// same fields with the same values in the same order. This mirrors what a
/// write-then-read round trip must reproduce.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(Map<String, FieldValue>);

impl FieldMap {
    /// Create an empty field map.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(
        &mut self,
        field: impl Into<String>,
        value: impl Into<FieldValue>,
    ) -> Option<FieldValue> {
        self.0.insert(field.into(), value.into())
    }

    /// Raw value of a field.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Value of a field if it is stored as a string.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Remove a field, preserving the order of the remaining ones.
    pub fn remove(&mut self, field: &str) -> Option<FieldValue> {
        self.0.shift_remove(field)
    }

    /// Returns `true` if the field is present.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the map holds no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Borrow the underlying JSON object.
    pub fn as_map(&self) -> &Map<String, FieldValue> {
        &self.0
    }

    /// Consume into the underlying JSON object.
    pub fn into_inner(self) -> Map<String, FieldValue> {
        self.0
    }
}

impl PartialEq for FieldMap {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.iter().eq(other.0.iter())
    }
}

impl Eq for FieldMap {}

impl From<Map<String, FieldValue>> for FieldMap {
    fn from(map: Map<String, FieldValue>) -> Self {
        Self(map)
    }
}

impl<K, V> FromIterator<(K, V)> for FieldMap
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, FieldValue);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn preserves_insertion_order() {
        let fields = FieldMap::new().with("title", "Foo").with("text", "Bar").with("a", 1);
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "text", "a"]);
    }

    #[test]
    fn equality_is_order_sensitive() {
        let a = FieldMap::from_iter([("title", "Foo"), ("text", "Bar")]);
        let b = FieldMap::from_iter([("text", "Bar"), ("title", "Foo")]);
        let c = FieldMap::from_iter([("title", "Foo"), ("text", "Bar")]);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut fields = FieldMap::from_iter([("title", "Foo"), ("text", "Bar")]);
        let previous = fields.insert("title", "Baz");
        assert_eq!(previous, Some(json!("Foo")));
        assert_eq!(fields.get_str("title"), Some("Baz"));
        assert_eq!(fields.keys().next().map(String::as_str), Some("title"));
    }

    #[test]
    fn remove_keeps_remaining_order() {
        let mut fields = FieldMap::from_iter([("a", 1), ("b", 2), ("c", 3)]);
        fields.remove("a");
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn structured_scalars() {
        let fields = FieldMap::new()
            .with("published", true)
            .with("rating", 4.5)
            .with("tags", "a, b");
        assert_eq!(fields.get("published"), Some(&json!(true)));
        assert_eq!(fields.get_str("rating"), None);
        assert_eq!(fields.len(), 3);
    }

    #[test]
    fn serializes_as_plain_object() {
        let fields = FieldMap::from_iter([("title", "Foo"), ("text", "Bar")]);
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"title":"Foo","text":"Bar"}"#);
    }

    proptest! {
        #[test]
        fn json_roundtrip_preserves_order(
            entries in proptest::collection::vec(("[a-z]{1,8}", ".*"), 0..12)
        ) {
            let fields: FieldMap = entries.into_iter().collect();
            let json = serde_json::to_string(&fields).unwrap();
            let parsed: FieldMap = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(parsed, fields);
        }
    }
}
