//! Error types shared by the lagwatch read and write paths.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding, decoding, or storing events.
#[derive(Error, Debug)]
pub enum Error {
    /// A store key did not have the `<prefix>-<zone>-<serial>` shape.
    #[error("malformed key '{key}': {reason}")]
    MalformedKey {
        /// The offending key.
        key: String,
        /// Description of what's wrong.
        reason: String,
    },

    /// A stored timestamp did not match its stream's format.
    #[error("invalid timestamp '{value}' (expected {format}): {source}")]
    InvalidTimestamp {
        /// The raw stored value.
        value: String,
        /// The chrono format string the stream expects.
        format: &'static str,
        /// Underlying parse failure.
        #[source]
        source: chrono::ParseError,
    },

    /// An API payload is missing a field required to build a store entry.
    #[error("malformed payload: missing field '{field}'")]
    MalformedPayload {
        /// Dotted path of the missing field (e.g. `zone.serial`).
        field: &'static str,
    },

    /// The event store could not complete an operation.
    #[error("store unavailable during {operation} '{key}': {reason}")]
    StoreUnavailable {
        /// The store operation that failed (`get`, `set`, `keys`, `open`).
        operation: &'static str,
        /// Key, prefix, or path the operation targeted.
        key: String,
        /// Underlying failure.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON encoding/decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Build a [`Error::StoreUnavailable`] from any displayable cause.
    pub fn store(operation: &'static str, key: impl Into<String>, reason: impl ToString) -> Self {
        Self::StoreUnavailable {
            operation,
            key: key.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error belongs to the decode family (bad key or timestamp).
    ///
    /// Decode errors are per-entry: the entry is skipped and the scan continues.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::MalformedKey { .. } | Self::InvalidTimestamp { .. })
    }

    /// Whether this error came from the store transport.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. })
    }
}
