use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

/// Exact-URL memoization of deserialized response bodies, scoped to one
/// client instance (one pipeline run). No TTL, no eviction: a repeated
/// identical URL within a run never costs a second round trip.
///
/// Access is sequential within a run; the mutex only exists to keep the
/// client `Send` across await points.
#[derive(Default)]
pub(crate) struct RequestCache {
    entries: Mutex<HashMap<String, Value>>,
}

impl RequestCache {
    pub(crate) fn get(&self, url: &str) -> Option<Value> {
        self.entries.lock().expect("cache lock poisoned").get(url).cloned()
    }

    pub(crate) fn insert(&self, url: &str, body: Value) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(url.to_string(), body);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }
}
