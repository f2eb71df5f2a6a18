//! Structured log record representation
//!
//! A record is a nested JSON object. The sampling filter only ever reads it
//! through path lookups; the host pipeline owns it and decides what happens
//! to it after the filter returns.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Nested key/value map backing a record or one of its sub-maps
pub type Fields = Map<String, Value>;

/// Why a path lookup on a record failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("key not found: {0}")]
    KeyNotFound(String),

    #[error("value at {0} is not a string")]
    NotString(String),

    #[error("value at {0} is not a map")]
    NotMap(String),
}

/// A structured log record as handed in by the pipeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: Fields,
}

impl LogRecord {
    pub fn new(fields: Fields) -> Self {
        Self { fields }
    }

    /// Parse one JSON object (typically an NDJSON line) into a record.
    pub fn from_json(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.fields)
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Look up a dotted path such as `kubernetes.labels`.
    pub fn get_value(&self, path: &str) -> Result<&Value, LookupError> {
        lookup(&self.fields, path)
    }

    /// Look up a dotted path and require a string value.
    pub fn get_str(&self, path: &str) -> Result<&str, LookupError> {
        self.get_value(path)?
            .as_str()
            .ok_or_else(|| LookupError::NotString(path.to_string()))
    }

    /// Look up a dotted path and require a nested map.
    pub fn get_map(&self, path: &str) -> Result<&Fields, LookupError> {
        self.get_value(path)?
            .as_object()
            .ok_or_else(|| LookupError::NotMap(path.to_string()))
    }

    /// Recursively merge `other` into this record. Nested maps are merged
    /// key by key, any other value overwrites what was there.
    pub fn deep_update(&mut self, other: &Fields) {
        merge(&mut self.fields, other);
    }
}

impl From<Fields> for LogRecord {
    fn from(fields: Fields) -> Self {
        Self::new(fields)
    }
}

/// Walk a dotted path through nested maps.
pub fn lookup<'a>(fields: &'a Fields, path: &str) -> Result<&'a Value, LookupError> {
    let mut segments = path.split('.');
    let first = segments.next().unwrap_or_default();
    let mut current = fields
        .get(first)
        .ok_or_else(|| LookupError::KeyNotFound(path.to_string()))?;

    for segment in segments {
        let map = current
            .as_object()
            .ok_or_else(|| LookupError::KeyNotFound(path.to_string()))?;
        current = map
            .get(segment)
            .ok_or_else(|| LookupError::KeyNotFound(path.to_string()))?;
    }
    Ok(current)
}

fn merge(target: &mut Fields, other: &Fields) {
    for (key, value) in other {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => merge(existing, incoming),
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}
