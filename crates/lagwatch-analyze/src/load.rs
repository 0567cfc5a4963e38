//! Loading one stream out of the event store.
//!
//! A load is a full prefix scan followed by one `get` per key. Individual
//! entries that can't be read or decoded are skipped and reported; only a
//! failed key listing aborts the load.

use lagwatch_core::{Event, EventKind, EventStore, Result, Serial, StreamCodec};
use metrics::counter;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tracing::{info, warn};

/// Decoded events of one stream, keyed by serial.
pub type EventMap = HashMap<Serial, Event>;

/// Why a scanned entry was left out of the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// Key or timestamp didn't match the stream's encoding.
    Decode(String),
    /// The store failed to return the value.
    Store(String),
    /// The key was listed but had no value by the time it was read.
    Vanished,
    /// Another entry of the same stream already claimed this serial.
    DuplicateSerial { kept: String },
}

impl SkipReason {
    /// Short label used in summaries and metric labels.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Store(_) => "store",
            Self::Vanished => "vanished",
            Self::DuplicateSerial { .. } => "duplicate_serial",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode(e) => write!(f, "decode error: {e}"),
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Vanished => f.write_str("key disappeared before it was read"),
            Self::DuplicateSerial { kept } => write!(f, "duplicate serial (kept {kept})"),
        }
    }
}

/// A store entry that was scanned but not loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub key: String,
    pub reason: SkipReason,
}

/// What happened while scanning one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub kind: EventKind,

    /// Keys returned by the prefix scan.
    pub scanned: usize,

    /// Entries decoded into events.
    pub decoded: usize,

    pub skipped: Vec<SkippedEntry>,
}

impl ScanReport {
    fn new(kind: EventKind) -> Self {
        Self {
            kind,
            scanned: 0,
            decoded: 0,
            skipped: Vec::new(),
        }
    }

    fn skip(&mut self, key: String, reason: SkipReason) {
        warn!(stream = %self.kind, key = %key, "Skipping entry: {}", reason);
        self.skipped.push(SkippedEntry { key, reason });
    }

    /// Skip counts grouped by [`SkipReason::label`].
    pub fn skip_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.skipped {
            *counts.entry(entry.reason.label()).or_insert(0) += 1;
        }
        counts
    }
}

/// A loaded stream plus its scan report.
#[derive(Debug, Clone)]
pub struct LoadedStream {
    pub events: EventMap,
    pub report: ScanReport,
}

/// Scan every entry of `codec`'s stream and decode it.
///
/// When two keys decode to the same serial the first in key order is kept.
pub fn load<S: EventStore + ?Sized>(store: &S, codec: &dyn StreamCodec) -> Result<LoadedStream> {
    let kind = codec.kind();
    let keys = store.keys(&codec.scan_prefix())?;

    let mut events = EventMap::with_capacity(keys.len());
    let mut loaded_from: HashMap<Serial, String> = HashMap::with_capacity(keys.len());
    let mut report = ScanReport::new(kind);

    for key in keys {
        report.scanned += 1;

        if key.contains(char::REPLACEMENT_CHARACTER) {
            report.skip(key, SkipReason::Decode("key is not valid UTF-8".to_string()));
            continue;
        }

        let value = match store.get(&key) {
            Ok(Some(value)) => value,
            Ok(None) => {
                report.skip(key, SkipReason::Vanished);
                continue;
            }
            Err(e) => {
                report.skip(key, SkipReason::Store(e.to_string()));
                continue;
            }
        };

        let event = match codec.decode(&key, &value) {
            Ok(event) => event,
            Err(e) => {
                report.skip(key, SkipReason::Decode(e.to_string()));
                continue;
            }
        };

        match events.entry(event.serial) {
            Entry::Occupied(existing) => {
                let kept = loaded_from
                    .get(existing.key())
                    .cloned()
                    .unwrap_or_default();
                report.skip(key, SkipReason::DuplicateSerial { kept });
            }
            Entry::Vacant(slot) => {
                loaded_from.insert(event.serial, key);
                slot.insert(event);
                report.decoded += 1;
            }
        }
    }

    counter!("correlate_entries_scanned_total", "stream" => kind.as_str())
        .increment(report.scanned as u64);
    counter!("correlate_entries_skipped_total", "stream" => kind.as_str())
        .increment(report.skipped.len() as u64);

    info!(
        "Loaded {} stream from {}: {} scanned, {} decoded, {} skipped",
        kind,
        store.name(),
        report.scanned,
        report.decoded,
        report.skipped.len()
    );

    Ok(LoadedStream { events, report })
}
