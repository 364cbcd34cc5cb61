//! Response cache for queries.

use gql_transport::{FetchPolicy, Operation};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Successful query results keyed by operation name and variables.
///
/// Mutations and `NetworkOnly` queries never touch the cache.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_cacheable(operation: &Operation) -> bool {
        operation.is_query() && operation.fetch_policy == FetchPolicy::CacheFirst
    }

    pub fn lookup(&self, operation: &Operation) -> Option<Value> {
        if !Self::is_cacheable(operation) {
            return None;
        }
        let hit = self.entries.lock().get(&operation.cache_key()).cloned();
        if hit.is_some() {
            debug!(operation = %operation.name, "Cache hit");
        }
        hit
    }

    pub fn store(&self, operation: &Operation, data: &Value) {
        if Self::is_cacheable(operation) {
            self.entries
                .lock()
                .insert(operation.cache_key(), data.clone());
        }
    }

    /// Drop every cached result.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        if !entries.is_empty() {
            debug!(entries = entries.len(), "Response cache cleared");
        }
        entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
