//! lagwatch write path.
//!
//! This crate turns provisioning acknowledgements from the load generator
//! into origin-stream entries in the event store.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │    Producer     │  (load generator, JSONL of API responses)
//! └────────┬────────┘
//!          │  BufferedItem
//!          ▼
//! ┌─────────────────┐
//! │ WriteBackBuffer │  Batches items, flushes on size threshold or shutdown
//! └────────┬────────┘
//!          │  api-<zone>-<serial> = <timestamp>
//!          ▼
//! ┌─────────────────┐
//! │   EventStore    │  RocksDB (or in-memory for tests)
//! └─────────────────┘
//! ```

pub mod buffer;
pub mod error;
pub mod payload;
pub mod source;

pub use buffer::{BufferStats, FlushFailure, FlushReport, WriteBackBuffer};
pub use error::{Error, Result};
pub use payload::{BufferedItem, Operation, StoreEntry, ZoneOperationResult, ZonePayload};
pub use source::{JsonlProducer, ProducerRecord, SourceStats};
