//! Per-stream encodings of store keys and timestamp values.
//!
//! # Key Format
//!
//! ```text
//! <prefix>-<zone>-<serial>
//! ```
//!
//! The zone may itself contain `-` and `.`, so the serial is always the
//! last `-`-delimited segment and the zone is everything between the prefix
//! and that segment.
//!
//! # Streams
//!
//! | Stream       | Prefix | Value format                  | Example                        |
//! |--------------|--------|-------------------------------|--------------------------------|
//! | Origin       | `api`  | `%Y-%m-%dT%H:%M:%S%.f`        | `2024-01-05T13:04:05.123456`   |
//! | Confirmation | `bind` | `%d-%b-%Y %H:%M:%S%.f`        | `05-Jan-2024 13:04:05.123456`  |
//!
//! Adding a stream means adding a [`StreamCodec`]; the join never changes.

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::event::{Event, EventKind, Serial, normalize_zone};

/// Decodes and encodes one stream's store entries.
pub trait StreamCodec: Send + Sync {
    /// The stream this codec handles.
    fn kind(&self) -> EventKind;

    /// Key prefix, without the trailing `-`.
    fn prefix(&self) -> &'static str;

    /// chrono format used to parse stored values.
    fn timestamp_format(&self) -> &'static str;

    /// chrono format used to write values (fixed six fractional digits).
    fn write_format(&self) -> &'static str;

    /// Decode a raw store entry into a normalized [`Event`].
    fn decode(&self, key: &str, value: &str) -> Result<Event> {
        let (zone, serial) = split_key(key, self.prefix())?;
        let timestamp = parse_timestamp(value, self.timestamp_format())?;
        Ok(Event::new(self.kind(), zone, serial, timestamp))
    }

    /// Encode an event as the `(key, value)` pair this stream stores.
    fn encode(&self, event: &Event) -> (String, String) {
        let key = format_key(self.prefix(), &self.stored_zone(&event.zone), event.serial);
        let value = event.timestamp.format(self.write_format()).to_string();
        (key, value)
    }

    /// How this stream spells a normalized zone inside its keys.
    fn stored_zone(&self, zone: &str) -> String {
        zone.to_string()
    }

    /// Prefix used for key scans (`<prefix>-`).
    fn scan_prefix(&self) -> String {
        format!("{}-", self.prefix())
    }
}

/// Codec for API acknowledgements.
#[derive(Debug, Clone, Copy, Default)]
pub struct OriginCodec;

/// Codec for downstream propagation confirmations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfirmationCodec;

/// Shared origin codec instance.
pub static ORIGIN_CODEC: OriginCodec = OriginCodec;

/// Shared confirmation codec instance.
pub static CONFIRMATION_CODEC: ConfirmationCodec = ConfirmationCodec;

impl StreamCodec for OriginCodec {
    fn kind(&self) -> EventKind {
        EventKind::Origin
    }

    fn prefix(&self) -> &'static str {
        "api"
    }

    fn timestamp_format(&self) -> &'static str {
        "%Y-%m-%dT%H:%M:%S%.f"
    }

    fn write_format(&self) -> &'static str {
        "%Y-%m-%dT%H:%M:%S%.6f"
    }
}

impl StreamCodec for ConfirmationCodec {
    fn kind(&self) -> EventKind {
        EventKind::Confirmation
    }

    fn prefix(&self) -> &'static str {
        "bind"
    }

    fn timestamp_format(&self) -> &'static str {
        "%d-%b-%Y %H:%M:%S%.f"
    }

    fn write_format(&self) -> &'static str {
        "%d-%b-%Y %H:%M:%S%.6f"
    }

    // The downstream logs zones without the trailing root dot.
    fn stored_zone(&self, zone: &str) -> String {
        zone.trim_end_matches('.').to_string()
    }
}

/// Build a store key from its parts.
pub fn format_key(prefix: &str, zone: &str, serial: Serial) -> String {
    format!("{prefix}-{zone}-{serial}")
}

/// Split `<prefix>-<zone>-<serial>` into its raw zone and serial.
///
/// The zone is returned as stored (not normalized) but must be non-empty
/// once dots are stripped.
pub fn split_key<'a>(key: &'a str, prefix: &str) -> Result<(&'a str, Serial)> {
    let malformed = |reason: &str| Error::MalformedKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    let rest = key
        .strip_prefix(prefix)
        .and_then(|r| r.strip_prefix('-'))
        .ok_or_else(|| malformed(&format!("expected prefix '{prefix}-'")))?;

    let (zone, serial) = rest
        .rsplit_once('-')
        .ok_or_else(|| malformed("missing '-' before serial"))?;

    if normalize_zone(zone) == "." {
        return Err(malformed("empty zone"));
    }

    let serial = serial
        .parse::<Serial>()
        .map_err(|e| malformed(&format!("serial '{serial}' is not an unsigned integer: {e}")))?;

    Ok((zone, serial))
}

/// Parse a stored timestamp with the given chrono format.
pub fn parse_timestamp(value: &str, format: &'static str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, format).map_err(|source| Error::InvalidTimestamp {
        value: value.to_string(),
        format,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    // =========================================================================
    // Key splitting
    // =========================================================================

    #[test]
    fn test_split_key_basic() {
        let (zone, serial) = split_key("api-acme.com.-100", "api").unwrap();
        assert_eq!(zone, "acme.com.");
        assert_eq!(serial, 100);
    }

    #[test]
    fn test_split_key_zone_with_hyphen() {
        let (zone, serial) = split_key("bind-my-zone.example.com-42", "bind").unwrap();
        assert_eq!(zone, "my-zone.example.com");
        assert_eq!(serial, 42);
    }

    #[test]
    fn test_split_key_wrong_prefix() {
        let err = split_key("bind-acme.com-1", "api").unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_split_key_prefix_must_be_followed_by_dash() {
        assert!(split_key("apix-acme.com.-1", "api").is_err());
    }

    #[test]
    fn test_split_key_missing_serial() {
        let err = split_key("api-acme.com.", "api").unwrap_err();
        assert!(err.to_string().contains("missing '-'"));
    }

    #[test]
    fn test_split_key_non_numeric_serial() {
        let err = split_key("api-acme.com.-abc", "api").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_split_key_empty_serial() {
        assert!(split_key("api-acme.com.-", "api").is_err());
    }

    #[test]
    fn test_split_key_empty_zone() {
        let err = split_key("api--100", "api").unwrap_err();
        assert!(err.to_string().contains("empty zone"));
    }

    // =========================================================================
    // Decoding
    // =========================================================================

    #[test]
    fn test_origin_decode() {
        let event = ORIGIN_CODEC
            .decode("api-acme.com.-100", "2024-01-05T13:00:00.000000")
            .unwrap();
        assert_eq!(event.kind, EventKind::Origin);
        assert_eq!(event.zone, "acme.com.");
        assert_eq!(event.serial, 100);
        assert_eq!(event.timestamp, ts(13, 0, 0, 0));
    }

    #[test]
    fn test_confirmation_decode_normalizes_zone() {
        let event = CONFIRMATION_CODEC
            .decode("bind-acme.com-100", "05-Jan-2024 13:00:30.000000")
            .unwrap();
        assert_eq!(event.kind, EventKind::Confirmation);
        assert_eq!(event.zone, "acme.com.");
        assert_eq!(event.timestamp, ts(13, 0, 30, 0));
    }

    #[test]
    fn test_confirmation_decode_keeps_microseconds() {
        let event = CONFIRMATION_CODEC
            .decode("bind-acme.com-1", "05-Jan-2024 13:04:05.123456")
            .unwrap();
        assert_eq!(event.timestamp, ts(13, 4, 5, 123_456));
    }

    #[test]
    fn test_origin_rejects_confirmation_format() {
        let err = ORIGIN_CODEC
            .decode("api-acme.com.-1", "05-Jan-2024 13:04:05.123456")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_confirmation_rejects_origin_format() {
        let err = CONFIRMATION_CODEC
            .decode("bind-acme.com-1", "2024-01-05T13:04:05.123456")
            .unwrap_err();
        assert!(err.is_decode());
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn test_origin_encode() {
        let event = Event::new(EventKind::Origin, "acme.com.", 7, ts(13, 4, 5, 123_456));
        let (key, value) = ORIGIN_CODEC.encode(&event);
        assert_eq!(key, "api-acme.com.-7");
        assert_eq!(value, "2024-01-05T13:04:05.123456");
    }

    #[test]
    fn test_confirmation_encode_drops_root_dot() {
        let event = Event::new(EventKind::Confirmation, "acme.com.", 7, ts(13, 4, 5, 0));
        let (key, value) = CONFIRMATION_CODEC.encode(&event);
        assert_eq!(key, "bind-acme.com-7");
        assert_eq!(value, "05-Jan-2024 13:04:05.000000");
    }

    #[test]
    fn test_encoded_entries_decode_back() {
        for codec in [EventKind::Origin.codec(), EventKind::Confirmation.codec()] {
            let event = Event::new(codec.kind(), "zone1.com.", 1_700_000_000_000_001, ts(1, 2, 3, 4));
            let (key, value) = codec.encode(&event);
            assert_eq!(codec.decode(&key, &value).unwrap(), event);
        }
    }

    #[test]
    fn test_scan_prefix() {
        assert_eq!(ORIGIN_CODEC.scan_prefix(), "api-");
        assert_eq!(CONFIRMATION_CODEC.scan_prefix(), "bind-");
    }
}
