//! Persistence gateway used by the planner service.

use anyhow::{Error, anyhow};
use miniplan_store_fs::{JsonStore, StoreError};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Flat key/value store of whole-collection snapshots.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Error type bubbled up from the backing store.
    type Error: Into<Error> + Send;

    /// Read the snapshot stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the snapshot cannot be read.
    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error>;

    /// Replace the snapshot stored under `key`.
    ///
    /// # Errors
    /// Returns a store-specific error when the snapshot cannot be written.
    fn set(&self, key: &str, value: &Value) -> Result<(), Self::Error>;
}

impl KeyValueStore for JsonStore {
    type Error = StoreError;

    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        Self::get(self, key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        Self::set(self, key, value)
    }
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        (**self).set(key, value)
    }
}

/// In-memory store, handy for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    buckets: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with snapshots.
    #[must_use]
    pub fn with_buckets(buckets: impl IntoIterator<Item = (String, Value)>) -> Self {
        Self {
            buckets: Mutex::new(buckets.into_iter().collect()),
        }
    }
}

impl KeyValueStore for MemoryStore {
    type Error = Error;

    fn get(&self, key: &str) -> Result<Option<Value>, Self::Error> {
        let buckets = self.buckets.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(buckets.get(key).cloned())
    }

    fn set(&self, key: &str, value: &Value) -> Result<(), Self::Error> {
        let mut buckets = self.buckets.lock().map_err(|_| anyhow!("memory store lock poisoned"))?;
        buckets.insert(key.to_owned(), value.clone());
        Ok(())
    }
}
