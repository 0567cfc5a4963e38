//! Serial-keyed join of the origin and confirmation streams.

use crate::load::EventMap;
use chrono::NaiveDateTime;
use lagwatch_core::{Event, Serial};
use serde::Serialize;
use tracing::{debug, warn};

/// Latency assigned to an origin event that was never confirmed.
pub const UNMATCHED_LATENCY: f64 = f64::INFINITY;

/// One origin event joined with its confirmation, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinedRecord {
    pub serial: Serial,

    /// Normalized zone of the origin event.
    pub zone: String,

    pub origin_timestamp: NaiveDateTime,

    /// `None` when no confirmation carried this serial.
    pub confirmation_timestamp: Option<NaiveDateTime>,

    /// Seconds from origin to confirmation, or [`UNMATCHED_LATENCY`].
    /// Serialized as `null` when unmatched.
    pub latency: f64,
}

impl JoinedRecord {
    fn new(origin: &Event, confirmation: Option<&Event>) -> Self {
        let confirmation_timestamp = confirmation.map(|c| c.timestamp);
        let latency = confirmation_timestamp
            .map(|confirmed| latency_seconds(origin.timestamp, confirmed))
            .unwrap_or(UNMATCHED_LATENCY);

        Self {
            serial: origin.serial,
            zone: origin.zone.clone(),
            origin_timestamp: origin.timestamp,
            confirmation_timestamp,
            latency,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.confirmation_timestamp.is_some()
    }

    /// Confirmed before it was issued. Points at clock skew or bad data.
    pub fn is_negative(&self) -> bool {
        self.is_matched() && self.latency < 0.0
    }
}

/// Join every origin event with the confirmation of the same serial.
///
/// Confirmations with no origin are ignored. The result is sorted by
/// ascending serial.
pub fn correlate(origin: &EventMap, confirmation: &EventMap) -> Vec<JoinedRecord> {
    let mut records: Vec<JoinedRecord> = origin
        .values()
        .map(|event| {
            let confirmed = confirmation.get(&event.serial);
            if let Some(c) = confirmed
                && c.zone != event.zone
            {
                debug!(
                    "Serial {} joined across zones: origin {} / confirmation {}",
                    event.serial, event.zone, c.zone
                );
            }
            JoinedRecord::new(event, confirmed)
        })
        .collect();

    records.sort_unstable_by_key(|r| r.serial);

    for record in records.iter().filter(|r| r.is_negative()) {
        warn!(
            serial = record.serial,
            zone = %record.zone,
            origin = %record.origin_timestamp,
            confirmation = ?record.confirmation_timestamp,
            "Negative latency {:.6}s",
            record.latency
        );
    }

    records
}

fn latency_seconds(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        // Only overflows for spans of ~292k years
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lagwatch_core::EventKind;

    fn ts(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    fn stream(kind: EventKind, events: &[(&str, Serial, NaiveDateTime)]) -> EventMap {
        events
            .iter()
            .map(|&(zone, serial, at)| (serial, Event::new(kind, zone, serial, at)))
            .collect()
    }

    #[test]
    fn test_matched_latency() {
        let origin = stream(EventKind::Origin, &[("acme.com.", 100, ts(13, 0, 0, 0))]);
        let confirmation = stream(
            EventKind::Confirmation,
            &[("acme.com", 100, ts(13, 0, 30, 0))],
        );

        let records = correlate(&origin, &confirmation);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latency, 30.0);
        assert_eq!(records[0].zone, "acme.com.");
        assert!(records[0].is_matched());
    }

    #[test]
    fn test_microsecond_precision() {
        let origin = stream(EventKind::Origin, &[("a.com.", 1, ts(13, 0, 0, 250_000))]);
        let confirmation = stream(
            EventKind::Confirmation,
            &[("a.com", 1, ts(13, 0, 1, 500_001))],
        );

        let records = correlate(&origin, &confirmation);
        assert!((records[0].latency - 1.250001).abs() < 1e-9);
    }

    #[test]
    fn test_unmatched_gets_sentinel() {
        let origin = stream(EventKind::Origin, &[("acme.com.", 7, ts(13, 0, 0, 0))]);
        let records = correlate(&origin, &EventMap::new());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].latency, UNMATCHED_LATENCY);
        assert!(records[0].latency.is_infinite());
        assert_eq!(records[0].confirmation_timestamp, None);
        assert!(!records[0].is_negative());
    }

    #[test]
    fn test_confirmation_only_serials_ignored() {
        let origin = stream(EventKind::Origin, &[("a.com.", 1, ts(13, 0, 0, 0))]);
        let confirmation = stream(
            EventKind::Confirmation,
            &[
                ("a.com", 1, ts(13, 0, 5, 0)),
                ("b.com", 2, ts(13, 0, 5, 0)),
                ("c.com", 3, ts(13, 0, 5, 0)),
            ],
        );

        let records = correlate(&origin, &confirmation);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].serial, 1);
    }

    #[test]
    fn test_sorted_by_serial() {
        let serials = [904, 17, 3_000_000, 5, 250, 18];
        let events: Vec<_> = serials
            .iter()
            .map(|&s| ("z.com.", s, ts(13, 0, 0, 0)))
            .collect();
        let origin = stream(EventKind::Origin, &events);
        let confirmation = stream(
            EventKind::Confirmation,
            &[("z.com", 250, ts(13, 1, 0, 0)), ("z.com", 5, ts(13, 2, 0, 0))],
        );

        let records = correlate(&origin, &confirmation);
        let order: Vec<Serial> = records.iter().map(|r| r.serial).collect();

        assert_eq!(order, vec![5, 17, 18, 250, 904, 3_000_000]);
        assert_eq!(records[0].latency, 120.0);
        assert_eq!(records[3].latency, 60.0);
        assert!(records[1].latency.is_infinite());
    }

    #[test]
    fn test_negative_latency_kept() {
        let origin = stream(EventKind::Origin, &[("a.com.", 1, ts(13, 0, 10, 0))]);
        let confirmation = stream(
            EventKind::Confirmation,
            &[("a.com", 1, ts(13, 0, 4, 0))],
        );

        let records = correlate(&origin, &confirmation);

        assert_eq!(records[0].latency, -6.0);
        assert!(records[0].is_negative());
    }

    #[test]
    fn test_unmatched_serializes_as_null() {
        let origin = stream(EventKind::Origin, &[("a.com.", 1, ts(13, 0, 0, 0))]);
        let records = correlate(&origin, &EventMap::new());

        let json = serde_json::to_value(&records[0]).unwrap();
        assert!(json["latency"].is_null());
        assert!(json["confirmation_timestamp"].is_null());
        assert_eq!(json["zone"], "a.com.");
    }
}
