//! Configuration loaded from environment variables.

use crate::{Error, Result};
use std::path::PathBuf;

/// Default write-back buffer threshold.
pub const DEFAULT_BUFFER_SIZE: usize = 100;

/// Shared configuration for the lagwatch binaries.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of the RocksDB event store.
    pub store_path: PathBuf,

    /// Number of buffered items that triggers a flush.
    pub buffer_size: usize,

    /// Prometheus metrics port (0 disables the endpoint).
    pub metrics_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from("./data/events"),
            buffer_size: DEFAULT_BUFFER_SIZE,
            metrics_port: 0,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Optional:
    /// - `LAGWATCH_STORE_PATH`: RocksDB directory (default: "./data/events")
    /// - `LAGWATCH_BUFFER_SIZE`: flush threshold, must be > 0 (default: 100)
    /// - `LAGWATCH_METRICS_PORT`: metrics port, 0 to disable (default: 0)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let store_path = std::env::var("LAGWATCH_STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.store_path);

        let buffer_size = match std::env::var("LAGWATCH_BUFFER_SIZE") {
            Ok(raw) => parse_buffer_size(&raw)?,
            Err(_) => defaults.buffer_size,
        };

        let metrics_port = match std::env::var("LAGWATCH_METRICS_PORT") {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|e| {
                Error::Config(format!("LAGWATCH_METRICS_PORT '{raw}' is not a port: {e}"))
            })?,
            Err(_) => defaults.metrics_port,
        };

        tracing::info!(
            store_path = %store_path.display(),
            buffer_size,
            metrics_port,
            "configuration loaded"
        );

        Ok(Self {
            store_path,
            buffer_size,
            metrics_port,
        })
    }
}

/// Parse and validate a buffer threshold.
pub fn parse_buffer_size(raw: &str) -> Result<usize> {
    let size = raw
        .trim()
        .parse::<usize>()
        .map_err(|e| Error::Config(format!("buffer size '{raw}' is not a number: {e}")))?;
    if size == 0 {
        return Err(Error::Config("buffer size must be greater than 0".to_string()));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mutex to serialize config tests that manipulate env vars.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "LAGWATCH_STORE_PATH",
        "LAGWATCH_BUFFER_SIZE",
        "LAGWATCH_METRICS_PORT",
    ];

    /// Helper to run config tests with isolated env vars.
    fn with_env_vars<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_MUTEX.lock().unwrap();

        let saved: Vec<_> = ENV_KEYS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: Serialized by mutex; only test code touches these vars.
        unsafe {
            for k in ENV_KEYS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        // SAFETY: Restoring original env state.
        unsafe {
            for (k, v) in &saved {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn config_defaults() {
        with_env_vars(&[], || {
            let config = Config::from_env().unwrap();
            assert_eq!(config.store_path, PathBuf::from("./data/events"));
            assert_eq!(config.buffer_size, 100);
            assert_eq!(config.metrics_port, 0);
        });
    }

    #[test]
    fn config_custom_values() {
        with_env_vars(
            &[
                ("LAGWATCH_STORE_PATH", "/var/lib/lagwatch"),
                ("LAGWATCH_BUFFER_SIZE", "250"),
                ("LAGWATCH_METRICS_PORT", "9095"),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.store_path, PathBuf::from("/var/lib/lagwatch"));
                assert_eq!(config.buffer_size, 250);
                assert_eq!(config.metrics_port, 9095);
            },
        );
    }

    #[test]
    fn config_zero_buffer_rejected() {
        with_env_vars(&[("LAGWATCH_BUFFER_SIZE", "0")], || {
            let err = Config::from_env().unwrap_err();
            assert!(matches!(err, Error::Config(_)));
        });
    }

    #[test]
    fn config_bad_port_rejected() {
        with_env_vars(&[("LAGWATCH_METRICS_PORT", "http")], || {
            assert!(Config::from_env().is_err());
        });
    }

    #[test]
    fn buffer_size_trims_whitespace() {
        assert_eq!(parse_buffer_size(" 42 ").unwrap(), 42);
        assert!(parse_buffer_size("-1").is_err());
    }
}
