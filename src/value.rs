//! Recursive attribute values carried inside XCP envelopes.
//!
//! The wire protocol knows three shapes: plain text items, `dt_array`
//! containers and `dt_assoc` containers. They map onto
//! [`AttributeValue::Scalar`], [`AttributeValue::List`] and
//! [`AttributeValue::Mapping`]. Mappings keep insertion order because the
//! request signature is computed over the exact encoded bytes.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// Leaf text value. Numbers and booleans travel as their string form.
    Scalar(String),
    /// Positional list (`dt_array`).
    List(Vec<AttributeValue>),
    /// Ordered key/value mapping (`dt_assoc`).
    Mapping(Attributes),
}

impl AttributeValue {
    /// Empty scalar, the wire form of a null value.
    pub fn empty() -> Self {
        AttributeValue::Scalar(String::new())
    }

    /// Borrow the text of a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AttributeValue::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the items of a list.
    pub fn as_list(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow the entries of a mapping.
    pub fn as_mapping(&self) -> Option<&Attributes> {
        match self {
            AttributeValue::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Convert into a JSON value, preserving mapping order.
    pub fn to_json(&self) -> JsonValue {
        match self {
            AttributeValue::Scalar(s) => JsonValue::String(s.clone()),
            AttributeValue::List(items) => {
                JsonValue::Array(items.iter().map(AttributeValue::to_json).collect())
            }
            AttributeValue::Mapping(map) => map.to_json(),
        }
    }

    /// Build a value from JSON.
    ///
    /// `null` becomes an empty scalar, booleans and numbers become their
    /// textual form.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => AttributeValue::empty(),
            JsonValue::Bool(b) => AttributeValue::Scalar(b.to_string()),
            JsonValue::Number(n) => AttributeValue::Scalar(n.to_string()),
            JsonValue::String(s) => AttributeValue::Scalar(s.clone()),
            JsonValue::Array(items) => {
                AttributeValue::List(items.iter().map(AttributeValue::from_json).collect())
            }
            JsonValue::Object(obj) => AttributeValue::Mapping(
                obj.iter()
                    .map(|(k, v)| (k.clone(), AttributeValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Scalar(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Scalar(value)
    }
}

impl From<&String> for AttributeValue {
    fn from(value: &String) -> Self {
        AttributeValue::Scalar(value.clone())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Scalar(value.to_string())
    }
}

macro_rules! scalar_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for AttributeValue {
                fn from(value: $ty) -> Self {
                    AttributeValue::Scalar(value.to_string())
                }
            }
        )*
    };
}

scalar_from_number!(i32, i64, u16, u32, u64, usize);

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_else(AttributeValue::empty)
    }
}

impl<T: Into<AttributeValue>> From<Vec<T>> for AttributeValue {
    fn from(items: Vec<T>) -> Self {
        AttributeValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<Attributes> for AttributeValue {
    fn from(map: Attributes) -> Self {
        AttributeValue::Mapping(map)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Scalar(s) => serializer.serialize_str(s),
            AttributeValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AttributeValue::Mapping(map) => map.serialize(serializer),
        }
    }
}

/// Ordered mapping with unique keys.
///
/// Inserting an existing key replaces the value at its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, AttributeValue)>,
}

impl Attributes {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key. Returns the previous value if any.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Look up a value by exact key.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Text of a scalar entry.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_scalar)
    }

    /// Remove a key, keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Convert into a JSON object, preserving order.
    pub fn to_json(&self) -> JsonValue {
        let mut obj = serde_json::Map::new();
        for (k, v) in &self.entries {
            obj.insert(k.clone(), v.to_json());
        }
        JsonValue::Object(obj)
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Attributes::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Attributes {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Attributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
