//! Event store client.
//!
//! The store is a flat string-to-string mapping shared by the producer
//! (write path) and the correlation engine (read path). The two never talk
//! to each other directly.
//!
//! # Implementations
//!
//! - [`MemoryStore`] - In-process map, for tests and dry runs
//! - [`RocksStore`] - RocksDB-backed durable store

mod memory;
mod rocks;

pub use memory::MemoryStore;
pub use rocks::RocksStore;

use crate::Result;
use std::sync::Arc;

/// A key/value event store.
///
/// Every method reports transport failures as
/// [`Error::StoreUnavailable`](crate::Error::StoreUnavailable) for the single
/// operation attempted; callers decide whether to retry.
pub trait EventStore: Send + Sync {
    /// Human-readable name for this store (used in logs).
    fn name(&self) -> &'static str;

    /// Fetch the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// List every key starting with `prefix`, in lexicographic order.
    ///
    /// Keys that are not valid UTF-8 are still listed, converted lossily so
    /// they contain `U+FFFD`. Callers must treat such keys as undecodable.
    fn keys(&self, prefix: &str) -> Result<Vec<String>>;
}

impl<S: EventStore + ?Sized> EventStore for Arc<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).keys(prefix)
    }
}
