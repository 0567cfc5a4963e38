//! RocksDB-backed event store.
//!
//! # Key Design
//!
//! - Keys: UTF-8 `<prefix>-<zone>-<serial>` strings, stored verbatim
//! - Values: UTF-8 timestamp strings, stored verbatim
//!
//! RocksDB keeps keys sorted bytewise, so a prefix scan is a forward
//! iteration from the prefix that stops at the first non-matching key.

use super::EventStore;
use crate::{Error, Result};
use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options, WriteOptions};
use std::path::Path;

/// Durable [`EventStore`] backed by RocksDB.
///
/// Thread-safe: can be shared across threads via `Arc<RocksStore>`.
pub struct RocksStore {
    db: DBWithThreadMode<MultiThreaded>,
    sync_writes: bool,
}

impl RocksStore {
    /// Open or create a store at the given path.
    ///
    /// Failing to open is reported as [`Error::StoreUnavailable`]; binaries
    /// treat it as fatal.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Opening event store at {}", path.display());

        let mut opts = Options::default();
        opts.create_if_missing(true);

        // Small values, write-mostly during a run
        opts.set_write_buffer_size(16 * 1024 * 1024); // 16MB write buffer
        opts.set_max_write_buffer_number(2);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.increase_parallelism(num_cpus::get().min(4) as i32);

        let db = DBWithThreadMode::<MultiThreaded>::open(&opts, path)
            .map_err(|e| Error::store("open", path.display().to_string(), e))?;

        Ok(Self {
            db,
            sync_writes: false,
        })
    }

    /// Fsync every write. Slower, but nothing acknowledged is lost on crash.
    pub fn with_sync_writes(mut self, sync: bool) -> Self {
        self.sync_writes = sync;
        self
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush().map_err(|e| Error::store("flush", "", e))
    }
}

impl EventStore for RocksStore {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.db.get(key).map_err(|e| Error::store("get", key, e))? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| Error::store("get", key, format!("value is not UTF-8: {e}"))),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .put_opt(key, value, &write_opts)
            .map_err(|e| Error::store("set", key, e))
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));

        for item in iter {
            let (key, _value) = item.map_err(|e| Error::store("keys", prefix, e))?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }

        Ok(keys)
    }
}
