use crate::domain::model::StorageSlice;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Checkout progress kept in the session, one slice per step key.
///
/// Slices are created empty the first time they are asked for, so readers never
/// have to distinguish "never visited" from "visited with nothing stored".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutStorage {
    slices: BTreeMap<String, StorageSlice>,
    modified: bool,
}

impl CheckoutStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds storage from the plain mapping kept in the session. Every slice is an
    /// independent copy; entries that are not mappings are replaced by empty slices.
    pub fn from_plain_mapping(plain: &Map<String, Value>) -> Self {
        let slices = plain
            .iter()
            .map(|(key, value)| {
                let slice = match value {
                    Value::Object(map) => map.clone(),
                    other => {
                        tracing::debug!("Discarding non-mapping storage entry '{}': {}", key, other);
                        StorageSlice::new()
                    }
                };
                (key.clone(), slice)
            })
            .collect();
        Self {
            slices,
            modified: false,
        }
    }

    /// Returns the slice for `key`, creating an empty one if needed.
    pub fn get(&mut self, key: &str) -> &mut StorageSlice {
        self.slices.entry(key.to_string()).or_default()
    }

    pub fn peek(&self, key: &str) -> Option<&StorageSlice> {
        self.slices.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.slices.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Called once the storage has been written back to the session.
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    /// Drops every slice whose key `keep` rejects and returns how many went.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.slices.len();
        self.slices.retain(|key, _| keep(key));
        let removed = before - self.slices.len();
        if removed > 0 {
            self.modified = true;
        }
        removed
    }

    pub fn as_plain_mapping(&self) -> Map<String, Value> {
        self.slices
            .iter()
            .map(|(key, slice)| (key.clone(), Value::Object(slice.clone())))
            .collect()
    }
}
