//! In-memory event store.

use super::EventStore;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-process [`EventStore`] backed by a sorted map.
///
/// Thread-safe. Operations on keys containing a configured substring can be
/// made to fail, which lets callers exercise per-item failure handling on
/// both the write and read paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
    failing_writes: Mutex<Vec<String>>,
    failing_reads: Mutex<Vec<String>>,
    expired_values: Mutex<Vec<String>>,
    fail_keys: AtomicBool,
    writes: AtomicUsize,
}

fn matches_any(patterns: &Mutex<Vec<String>>, key: &str) -> bool {
    patterns.lock().iter().any(|p| key.contains(p.as_str()))
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `set` whose key contains `pattern` fail.
    pub fn fail_writes_matching(&self, pattern: impl Into<String>) {
        self.failing_writes.lock().push(pattern.into());
    }

    /// Make every `get` whose key contains `pattern` fail.
    pub fn fail_reads_matching(&self, pattern: impl Into<String>) {
        self.failing_reads.lock().push(pattern.into());
    }

    /// Make every `get` whose key contains `pattern` find no value, as if the
    /// entry expired between listing and reading. `keys` still lists it.
    pub fn expire_values_matching(&self, pattern: impl Into<String>) {
        self.expired_values.lock().push(pattern.into());
    }

    /// Make every `keys` call fail.
    pub fn fail_keys(&self, fail: bool) {
        self.fail_keys.store(fail, Ordering::Relaxed);
    }

    /// Number of `set` calls attempted, including failed ones.
    pub fn write_attempts(&self) -> usize {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl EventStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        if matches_any(&self.failing_reads, key) {
            return Err(Error::store("get", key, "injected read failure"));
        }
        if matches_any(&self.expired_values, key) {
            return Ok(None);
        }
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.writes.fetch_add(1, Ordering::Relaxed);

        if matches_any(&self.failing_writes, key) {
            return Err(Error::store("set", key, "injected write failure"));
        }

        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        if self.fail_keys.load(Ordering::Relaxed) {
            return Err(Error::store("keys", prefix, "injected scan failure"));
        }

        let entries = self.entries.lock();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let store = MemoryStore::new();
        store.set("api-a.com.-1", "v1").unwrap();
        assert_eq!(store.get("api-a.com.-1").unwrap().as_deref(), Some("v1"));
        assert_eq!(store.get("api-a.com.-2").unwrap(), None);
    }

    #[test]
    fn test_keys_prefix_and_order() {
        let store = MemoryStore::new();
        store.set("bind-a.com-2", "x").unwrap();
        store.set("api-b.com.-2", "x").unwrap();
        store.set("api-a.com.-1", "x").unwrap();
        store.set("apix", "x").unwrap();

        let keys = store.keys("api-").unwrap();
        assert_eq!(keys, vec!["api-a.com.-1", "api-b.com.-2"]);

        let keys = store.keys("bind-").unwrap();
        assert_eq!(keys, vec!["bind-a.com-2"]);
    }

    #[test]
    fn test_injected_failure() {
        let store = MemoryStore::new();
        store.fail_writes_matching("-13");

        assert!(store.set("api-a.com.-12", "x").is_ok());
        let err = store.set("api-a.com.-13", "x").unwrap_err();
        assert!(err.is_store());

        assert_eq!(store.write_attempts(), 2);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_injected_read_failures() {
        let store = MemoryStore::new();
        store.set("bind-a.com-1", "x").unwrap();
        store.set("bind-a.com-2", "x").unwrap();
        store.set("bind-a.com-3", "x").unwrap();
        store.fail_reads_matching("-2");
        store.expire_values_matching("-3");

        assert_eq!(store.get("bind-a.com-1").unwrap().as_deref(), Some("x"));
        assert!(store.get("bind-a.com-2").unwrap_err().is_store());
        assert_eq!(store.get("bind-a.com-3").unwrap(), None);

        // Listing is unaffected by read faults
        assert_eq!(store.keys("bind-").unwrap().len(), 3);
    }

    #[test]
    fn test_injected_keys_failure() {
        let store = MemoryStore::new();
        store.set("api-a.com.-1", "x").unwrap();

        store.fail_keys(true);
        assert!(store.keys("api-").unwrap_err().is_store());

        store.fail_keys(false);
        assert_eq!(store.keys("api-").unwrap().len(), 1);
    }
}
