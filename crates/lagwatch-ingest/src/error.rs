//! Error types for the write path.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while producing and persisting events.
#[derive(Error, Debug)]
pub enum Error {
    /// Event model, store, or configuration error.
    #[error(transparent)]
    Core(#[from] lagwatch_core::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A producer input line could not be parsed.
    #[error("source error at line {line}: {reason}")]
    Source {
        /// 1-based input line number.
        line: usize,
        /// Description of what's wrong.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_is_transparent() {
        let core = lagwatch_core::Error::MalformedPayload { field: "zone.name" };
        let err: Error = core.into();
        assert_eq!(err.to_string(), "malformed payload: missing field 'zone.name'");
    }

    #[test]
    fn test_source_display() {
        let err = Error::Source {
            line: 7,
            reason: "expected value".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 7"));
        assert!(msg.contains("expected value"));
    }
}
