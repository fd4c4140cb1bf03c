//! Configuration Snapshot

use crate::properties::Properties;
use std::collections::HashMap;

/// One immutable, fully parsed key/value mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    values: HashMap<String, String>,
}

impl Snapshot {
    /// Build a snapshot, trimming every value
    pub fn from_properties(properties: Properties) -> Self {
        let values = properties
            .into_iter()
            .map(|(key, value)| {
                let trimmed = value.trim();
                let value = if trimmed.len() == value.len() { value } else { trimmed.to_string() };
                (key, value)
            })
            .collect();
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Owned copy of the mapping
    pub fn to_map(&self) -> HashMap<String, String> {
        self.values.clone()
    }
}
