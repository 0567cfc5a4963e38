//! The normalized event model shared by both streams.
//!
//! Both the origin stream (API acknowledgements) and the confirmation stream
//! (downstream propagation logs) decode into the same [`Event`] type, so the
//! join and the latency math never see stream-specific encodings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codec::{CONFIRMATION_CODEC, ORIGIN_CODEC, StreamCodec};

/// Zone serial number: the join key between the two streams.
pub type Serial = u64;

/// Which stream an event was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The API layer acknowledged a provisioning operation.
    Origin,
    /// The downstream authoritative system observed the operation.
    Confirmation,
}

impl EventKind {
    /// The codec that reads and writes this stream's store entries.
    pub fn codec(self) -> &'static dyn StreamCodec {
        match self {
            Self::Origin => &ORIGIN_CODEC,
            Self::Confirmation => &CONFIRMATION_CODEC,
        }
    }

    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Origin => "origin",
            Self::Confirmation => "confirmation",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single decoded observation from either stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Stream the event came from.
    pub kind: EventKind,

    /// Normalized zone name (lowercase, single trailing `.`).
    pub zone: String,

    /// Zone serial; immutable once observed.
    pub serial: Serial,

    /// When the event happened, with microsecond precision.
    pub timestamp: NaiveDateTime,
}

impl Event {
    /// Create an event, normalizing the zone name.
    pub fn new(kind: EventKind, zone: &str, serial: Serial, timestamp: NaiveDateTime) -> Self {
        Self {
            kind,
            zone: normalize_zone(zone),
            serial,
            timestamp,
        }
    }
}

/// Canonicalize a zone name so both streams agree on it.
///
/// Leading and trailing dots are stripped, the name is lowercased, and a
/// single trailing `.` is appended. An empty or all-dot name normalizes to
/// `"."`; callers that need a real zone must reject that.
pub fn normalize_zone(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('.');
    let mut zone = trimmed.to_lowercase();
    zone.push('.');
    zone
}
