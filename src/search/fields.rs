//! Field paths, attribute keys and leaf value coercion
//!
//! Records are resolved through their serialized form. Every value a field
//! path lands on is classified into a [`LeafValue`] before it reaches the
//! matcher; values that cannot be coerced to text fail index construction.

use crate::error::SearchError;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::fmt;

/// Text fed to the matcher for missing and null fields
pub const ABSENT_TEXT: &str = "false";

/// Ordered path segments locating a value inside a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse dotted notation, e.g. `manifest.title`
    pub fn parse(dotted: &str) -> Self {
        Self::new(
            dotted
                .split('.')
                .map(str::trim)
                .filter(|segment| !segment.is_empty()),
        )
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(dotted: &str) -> Self {
        Self::parse(dotted)
    }
}

impl From<String> for FieldPath {
    fn from(dotted: String) -> Self {
        Self::parse(&dotted)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

/// Attribute name to field path mapping, in registration order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeKeys {
    entries: Vec<(String, FieldPath)>,
}

impl AttributeKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute, replacing the path of an existing one
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<FieldPath>) {
        let name = name.into().trim().to_string();
        let path = path.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = path,
            None => self.entries.push((name, path)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, path: impl Into<FieldPath>) -> Self {
        self.insert(name, path);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldPath> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, path)| path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldPath)> {
        self.entries.iter().map(|(name, path)| (name.as_str(), path))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct field paths across all attributes, first registration wins
    pub fn union_paths(&self) -> Vec<FieldPath> {
        let mut paths: Vec<FieldPath> = Vec::with_capacity(self.entries.len());
        for (_, path) in &self.entries {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }
}

impl<N, P> FromIterator<(N, P)> for AttributeKeys
where
    N: Into<String>,
    P: Into<FieldPath>,
{
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut keys = AttributeKeys::new();
        for (name, path) in iter {
            keys.insert(name, path);
        }
        keys
    }
}

impl Serialize for AttributeKeys {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(
            self.entries
                .iter()
                .map(|(name, path)| (name, path.to_string())),
        )
    }
}

// Deserialized through a visitor so the file's key order is kept.
impl<'de> Deserialize<'de> for AttributeKeys {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeysVisitor;

        impl<'de> Visitor<'de> for KeysVisitor {
            type Value = AttributeKeys;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of attribute names to dotted field paths")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut keys = AttributeKeys::new();
                while let Some((name, path)) = map.next_entry::<String, String>()? {
                    keys.insert(name, path);
                }
                Ok(keys)
            }
        }

        deserializer.deserialize_map(KeysVisitor)
    }
}

/// A value located by a field path, classified for indexing
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    Text(String),
    TextList(Vec<String>),
    Bool(bool),
    Number(Number),
    Absent,
}

impl LeafValue {
    fn classify(value: &Value, path: &FieldPath) -> Result<Self, SearchError> {
        match value {
            Value::Null => Ok(LeafValue::Absent),
            Value::Bool(flag) => Ok(LeafValue::Bool(*flag)),
            Value::Number(number) => Ok(LeafValue::Number(number.clone())),
            Value::String(text) => Ok(LeafValue::Text(text.clone())),
            Value::Array(items) => {
                let mut texts = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Null => {}
                        Value::String(text) => texts.push(text.clone()),
                        Value::Bool(flag) => texts.push(flag.to_string()),
                        Value::Number(number) => texts.push(number.to_string()),
                        Value::Array(_) => return Err(unsupported(path, "nested array")),
                        Value::Object(_) => return Err(unsupported(path, "object in array")),
                    }
                }
                Ok(LeafValue::TextList(texts))
            }
            Value::Object(_) => Err(unsupported(path, "object")),
        }
    }

    /// Coerced text forms fed to the matcher
    pub fn into_texts(self) -> Vec<String> {
        match self {
            LeafValue::Text(text) => vec![text],
            LeafValue::TextList(texts) => texts,
            LeafValue::Bool(flag) => vec![flag.to_string()],
            LeafValue::Number(number) => vec![number.to_string()],
            LeafValue::Absent => vec![ABSENT_TEXT.to_string()],
        }
    }
}

fn unsupported(path: &FieldPath, kind: &'static str) -> SearchError {
    SearchError::UnsupportedValueType {
        path: path.to_string(),
        kind,
    }
}

/// Resolve every leaf a path reaches inside a serialized record.
///
/// An array met before the last segment fans the remaining path out over
/// its elements.
pub fn resolve(record: &Value, path: &FieldPath) -> Result<Vec<LeafValue>, SearchError> {
    let mut leaves = Vec::new();
    walk(record, path.segments(), path, &mut leaves)?;
    Ok(leaves)
}

fn walk(
    value: &Value,
    segments: &[String],
    path: &FieldPath,
    leaves: &mut Vec<LeafValue>,
) -> Result<(), SearchError> {
    let Some((head, rest)) = segments.split_first() else {
        leaves.push(LeafValue::classify(value, path)?);
        return Ok(());
    };

    match value {
        Value::Object(map) => match map.get(head) {
            Some(child) => walk(child, rest, path, leaves),
            None => {
                leaves.push(LeafValue::Absent);
                Ok(())
            }
        },
        Value::Array(items) => {
            for item in items {
                walk(item, segments, path, leaves)?;
            }
            Ok(())
        }
        _ => {
            leaves.push(LeafValue::Absent);
            Ok(())
        }
    }
}

/// Resolve and coerce a path into matcher texts
pub fn extract_texts(record: &Value, path: &FieldPath) -> Result<Vec<String>, SearchError> {
    Ok(resolve(record, path)?
        .into_iter()
        .flat_map(LeafValue::into_texts)
        .collect())
}
