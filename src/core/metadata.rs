//! Structured metadata attached to log records
//!
//! This module provides:
//! - `MetaValue`: a dynamically shaped value (scalars, arrays, nested maps)
//! - `LoggerMetadata`: a string-keyed map of `MetaValue`s
//!
//! Keys are kept in a `BTreeMap` so rendered output is stable between runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured metadata fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<MetaValue>),
    Object(LoggerMetadata),
}

impl MetaValue {
    /// Scalars are everything that is not an array or an object
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, MetaValue::Array(_) | MetaValue::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&LoggerMetadata> {
        match self {
            MetaValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            MetaValue::Null => serde_json::Value::Null,
            MetaValue::Bool(b) => serde_json::Value::Bool(*b),
            MetaValue::Int(i) => serde_json::Value::Number((*i).into()),
            MetaValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            MetaValue::String(s) => serde_json::Value::String(s.clone()),
            MetaValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(MetaValue::to_json_value).collect())
            }
            MetaValue::Object(map) => map.to_json_value(),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::Null => write!(f, "null"),
            MetaValue::Bool(b) => write!(f, "{}", b),
            MetaValue::Int(i) => write!(f, "{}", i),
            MetaValue::Float(fl) => write!(f, "{}", fl),
            MetaValue::String(s) => write!(f, "{}", s),
            MetaValue::Array(_) | MetaValue::Object(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl From<serde_json::Value> for MetaValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => MetaValue::Null,
            serde_json::Value::Bool(b) => MetaValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MetaValue::Int(i),
                None => n.as_f64().map(MetaValue::Float).unwrap_or(MetaValue::Null),
            },
            serde_json::Value::String(s) => MetaValue::String(s),
            serde_json::Value::Array(items) => {
                MetaValue::Array(items.into_iter().map(MetaValue::from).collect())
            }
            serde_json::Value::Object(map) => MetaValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, MetaValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<i64> for MetaValue {
    fn from(i: i64) -> Self {
        MetaValue::Int(i)
    }
}

impl From<i32> for MetaValue {
    fn from(i: i32) -> Self {
        MetaValue::Int(i as i64)
    }
}

impl From<u32> for MetaValue {
    fn from(i: u32) -> Self {
        MetaValue::Int(i as i64)
    }
}

impl From<u64> for MetaValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(MetaValue::Int)
            .unwrap_or(MetaValue::Float(i as f64))
    }
}

impl From<usize> for MetaValue {
    fn from(i: usize) -> Self {
        MetaValue::from(i as u64)
    }
}

impl From<f64> for MetaValue {
    fn from(f: f64) -> Self {
        MetaValue::Float(f)
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl<T: Into<MetaValue>> From<Vec<T>> for MetaValue {
    fn from(items: Vec<T>) -> Self {
        MetaValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<MetaValue>> From<Option<T>> for MetaValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(MetaValue::Null)
    }
}

impl From<LoggerMetadata> for MetaValue {
    fn from(map: LoggerMetadata) -> Self {
        MetaValue::Object(map)
    }
}

/// String-keyed metadata attached to a logger or a single log call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoggerMetadata {
    fields: BTreeMap<String, MetaValue>,
}

impl LoggerMetadata {
    /// Create a new empty metadata map
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder version)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field, replacing any previous value under the same key
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<MetaValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetaValue)> {
        self.fields.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Shallow merge: keys from `overrides` win on collision.
    ///
    /// Neither input is modified.
    #[must_use]
    pub fn merged(&self, overrides: &LoggerMetadata) -> LoggerMetadata {
        if overrides.is_empty() {
            return self.clone();
        }
        let mut fields = self.fields.clone();
        for (key, value) in overrides.iter() {
            fields.insert(key.clone(), value.clone());
        }
        LoggerMetadata { fields }
    }

    /// Build a metadata map from a JSON object; other JSON shapes yield `None`
    pub fn from_json_value(value: serde_json::Value) -> Option<Self> {
        match MetaValue::from(value) {
            MetaValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json_value()))
                .collect(),
        )
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl<K: Into<String>, V: Into<MetaValue>> FromIterator<(K, V)> for LoggerMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for LoggerMetadata {
    type Item = (String, MetaValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<'a> IntoIterator for &'a LoggerMetadata {
    type Item = (&'a String, &'a MetaValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, MetaValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl fmt::Display for LoggerMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}
