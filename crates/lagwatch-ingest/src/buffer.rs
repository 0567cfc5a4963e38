//! Write-back buffer in front of the event store.
//!
//! This module provides the [`WriteBackBuffer`] which accumulates
//! [`BufferedItem`]s from the producer and persists them in batches.
//!
//! # Flushing
//!
//! A flush happens when:
//! 1. An `append` brings the buffer to `max_size` items (synchronously, on
//!    the appending caller's thread)
//! 2. The owner calls [`WriteBackBuffer::flush`] explicitly
//!
//! Every item is removed from the buffer as its write is attempted, whether
//! or not the write succeeds. Failed items are returned in the
//! [`FlushReport`] and logged; they are never re-queued, so memory stays
//! bounded when the store is down.
//!
//! # Shutdown
//!
//! The buffer does not flush itself on drop. Whoever owns it must call
//! `flush()` on shutdown and on interruption.

use crate::payload::BufferedItem;
use crate::{Error, Result};
use lagwatch_core::EventStore;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// An item whose write failed during a flush.
#[derive(Debug)]
pub struct FlushFailure {
    /// The dropped item, with enough detail to reconstruct it.
    pub item: BufferedItem,

    /// Why the write failed.
    pub error: lagwatch_core::Error,
}

impl FlushFailure {
    /// Short failure class used in summaries and metric labels.
    pub fn reason(&self) -> &'static str {
        match &self.error {
            lagwatch_core::Error::MalformedPayload { .. } => "malformed_payload",
            lagwatch_core::Error::StoreUnavailable { .. } => "store_unavailable",
            _ => "other",
        }
    }
}

/// Outcome of one flush.
#[derive(Debug, Default)]
pub struct FlushReport {
    /// Items taken out of the buffer and attempted.
    pub attempted: usize,

    /// Items persisted successfully.
    pub written: usize,

    /// Items that could not be persisted.
    pub failures: Vec<FlushFailure>,
}

impl FlushReport {
    /// Number of failed items.
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Whether every attempted item was written.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Failure counts grouped by [`FlushFailure::reason`].
    pub fn failure_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for failure in &self.failures {
            *counts.entry(failure.reason()).or_insert(0) += 1;
        }
        counts
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: FlushReport) {
        self.attempted += other.attempted;
        self.written += other.written;
        self.failures.extend(other.failures);
    }
}

/// Buffer that batches producer output into the event store.
///
/// Thread-safe: the item list is behind a mutex that is held across the
/// threshold check and the whole flush, so at most one flush runs at a time
/// and concurrent producers can share the buffer through an `Arc`.
pub struct WriteBackBuffer<S: EventStore> {
    store: S,
    max_size: usize,
    items: Mutex<Vec<BufferedItem>>,
    flushes: AtomicU64,
    items_written: AtomicU64,
    items_failed: AtomicU64,
}

impl<S: EventStore> WriteBackBuffer<S> {
    /// Create a buffer that flushes into `store` once it holds `max_size` items.
    pub fn new(store: S, max_size: usize) -> Result<Self> {
        if max_size == 0 {
            return Err(Error::Core(lagwatch_core::Error::Config(
                "buffer max_size must be greater than 0".to_string(),
            )));
        }

        info!(
            "WriteBackBuffer initialized: store={}, max_size={}",
            store.name(),
            max_size
        );

        Ok(Self {
            store,
            max_size,
            items: Mutex::new(Vec::with_capacity(max_size)),
            flushes: AtomicU64::new(0),
            items_written: AtomicU64::new(0),
            items_failed: AtomicU64::new(0),
        })
    }

    /// Add an item, flushing the whole buffer if it reaches `max_size`.
    ///
    /// Returns the report of the flush this call triggered, if any. That call
    /// blocks for the duration of the flush.
    pub fn append(&self, item: BufferedItem) -> Option<FlushReport> {
        let mut items = self.items.lock();
        items.push(item);
        counter!("buffer_items_appended_total").increment(1);

        if items.len() >= self.max_size {
            Some(self.drain(&mut items))
        } else {
            gauge!("buffer_pending_items").set(items.len() as f64);
            None
        }
    }

    /// Persist every buffered item now.
    ///
    /// An empty buffer is a no-op: nothing is written and the returned report
    /// is empty.
    pub fn flush(&self) -> FlushReport {
        let mut items = self.items.lock();
        self.drain(&mut items)
    }

    /// Drain `items` oldest first, attempting each write exactly once.
    fn drain(&self, items: &mut Vec<BufferedItem>) -> FlushReport {
        let mut report = FlushReport::default();
        if items.is_empty() {
            return report;
        }

        info!(
            "Flushing buffer: {} items to {} store",
            items.len(),
            self.store.name()
        );

        for item in items.drain(..) {
            report.attempted += 1;
            match self.persist(&item) {
                Ok(()) => {
                    report.written += 1;
                }
                Err(error) => {
                    warn!(
                        operation = %item.operation,
                        payload = %item.payload_json(),
                        error = %error,
                        "Failed to store buffered item"
                    );
                    report.failures.push(FlushFailure { item, error });
                }
            }
        }

        self.flushes.fetch_add(1, Ordering::Relaxed);
        self.items_written
            .fetch_add(report.written as u64, Ordering::Relaxed);
        self.items_failed
            .fetch_add(report.failed() as u64, Ordering::Relaxed);

        counter!("buffer_flushes_total").increment(1);
        counter!("buffer_items_written_total").increment(report.written as u64);
        for (reason, count) in report.failure_counts() {
            counter!("buffer_items_failed_total", "reason" => reason).increment(count as u64);
        }
        gauge!("buffer_pending_items").set(0.0);

        if report.is_clean() {
            info!("Flush complete: {} items written", report.written);
        } else {
            warn!(
                "Flush complete: {} written, {} failed ({:?})",
                report.written,
                report.failed(),
                report.failure_counts()
            );
        }

        report
    }

    /// Write a single item to the store.
    fn persist(&self, item: &BufferedItem) -> lagwatch_core::Result<()> {
        let entry = item.store_entry()?;
        self.store.set(&entry.key, &entry.value)?;
        debug!("Stored {} = {}", entry.key, entry.value);
        Ok(())
    }

    /// Number of items waiting to be flushed.
    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    /// Whether nothing is waiting to be flushed.
    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// The flush threshold.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get statistics about the buffer.
    pub fn stats(&self) -> BufferStats {
        BufferStats {
            pending: self.len(),
            flushes: self.flushes.load(Ordering::Relaxed),
            items_written: self.items_written.load(Ordering::Relaxed),
            items_failed: self.items_failed.load(Ordering::Relaxed),
        }
    }
}

impl<S: EventStore> Drop for WriteBackBuffer<S> {
    fn drop(&mut self) {
        let pending = self.items.get_mut().len();
        if pending > 0 {
            warn!(
                "WriteBackBuffer dropped with {} unflushed items; they are lost",
                pending
            );
        }
    }
}

/// Statistics about the write-back buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStats {
    /// Items currently buffered.
    pub pending: usize,

    /// Flushes that attempted at least one item.
    pub flushes: u64,

    /// Items persisted across all flushes.
    pub items_written: u64,

    /// Items dropped after a failed write across all flushes.
    pub items_failed: u64,
}
