//! Core types and the event store client for lagwatch.
//!
//! lagwatch measures how long a provisioning operation takes to propagate:
//! the API layer acknowledges an operation (origin event) and, some time
//! later, the downstream authoritative system logs the same zone serial
//! (confirmation event). Both sides are recorded in a shared key/value store.
//!
//! This crate provides:
//! - The normalized [`Event`] model and zone normalization
//! - Per-stream [`StreamCodec`]s for key and timestamp encodings
//! - The [`EventStore`] client trait with in-memory and RocksDB backends
//! - Configuration, error types, and Prometheus metrics helpers

pub mod codec;
mod config;
mod error;
mod event;
pub mod metrics;
pub mod store;

pub use codec::{
    CONFIRMATION_CODEC, ConfirmationCodec, ORIGIN_CODEC, OriginCodec, StreamCodec, format_key,
    parse_timestamp, split_key,
};
pub use config::{Config, DEFAULT_BUFFER_SIZE, parse_buffer_size};
pub use error::{Error, Result};
pub use event::{Event, EventKind, Serial, normalize_zone};
pub use store::{EventStore, MemoryStore, RocksStore};
