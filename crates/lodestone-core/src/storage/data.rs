use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::error::{Result, StorageError};

/// Typed key-value mapping used by the data stores.
///
/// Values are kept as JSON values; typed access goes through serde. The
/// serialized form is a single flattened JSON object, which is also the
/// on-disk shape of the flat-file backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataMap {
    #[serde(flatten)]
    values: HashMap<String, Value>,
}

impl DataMap {
    /// Create a new empty mapping
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Create a mapping from a HashMap
    pub fn from_hashmap(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// Get a typed value
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Get a typed value with a default
    pub fn get_or<T: for<'de> Deserialize<'de>>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Get the raw value for a key
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Set a value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| StorageError::Serialization {
            format: "json".to_string(),
            source: Box::new(e),
        })?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Get all keys
    pub fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Merge another mapping in, overriding existing values
    pub fn merge(&mut self, other: &DataMap) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| StorageError::Serialization {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }

    /// Deserialize from JSON
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|e| StorageError::Deserialization {
            format: "json".to_string(),
            source: Box::new(e),
        })
    }
}
