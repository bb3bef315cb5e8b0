// MIT License - Copyright (c) 2026 Peter Wright
// Panel data snapshot

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::constants::LOCK_STATUS_KEY;
use crate::endpoints::DataEndpoint;

/// Result of one bulk retrieval.
///
/// Holds the raw JSON of every endpoint that answered, keyed by logical
/// name. Endpoints that failed are simply missing. The lock status is kept
/// apart so it is always present; it serializes under `"Lock Status"`
/// alongside the other keys.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelSnapshot {
    data: BTreeMap<String, Value>,
    lock_status: Value,
}

impl PanelSnapshot {
    pub fn new(data: BTreeMap<String, Value>, lock_status: Value) -> Self {
        Self { data, lock_status }
    }

    /// Look up any key, `"Lock Status"` included.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key == LOCK_STATUS_KEY {
            Some(&self.lock_status)
        } else {
            self.data.get(key)
        }
    }

    pub fn endpoint(&self, endpoint: DataEndpoint) -> Option<&Value> {
        self.data.get(endpoint.key())
    }

    /// Lock status; an empty array when the fetch failed.
    pub fn lock_status(&self) -> &Value {
        &self.lock_status
    }

    /// Keys of the data endpoints that answered (lock status excluded).
    pub fn data_keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Number of data entries, lock status excluded.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when no data endpoint answered.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flatten into a JSON object, lock status included.
    pub fn to_map(&self) -> serde_json::Map<String, Value> {
        let mut map: serde_json::Map<String, Value> = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.insert(LOCK_STATUS_KEY.to_string(), self.lock_status.clone());
        map
    }
}

impl Serialize for PanelSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len() + 1))?;
        for (key, value) in &self.data {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(LOCK_STATUS_KEY, &self.lock_status)?;
        map.end()
    }
}
