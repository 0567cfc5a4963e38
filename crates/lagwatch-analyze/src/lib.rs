//! lagwatch read path.
//!
//! Loads the origin and confirmation streams out of the event store, joins
//! them on zone serial, and reports propagation latency.
//!
//! # Pipeline
//!
//! ```text
//!  api-*  ──load──┐
//!                 ├──correlate──▶ Vec<JoinedRecord> ──summarize──▶ LatencySummary
//!  bind-* ──load──┘
//! ```
//!
//! Every origin event yields exactly one [`JoinedRecord`], in ascending
//! serial order. Confirmations with no origin are dropped.

pub mod analysis;
pub mod correlate;
pub mod load;
pub mod report;
pub mod summary;

pub use analysis::{Analysis, analyze};
pub use correlate::{JoinedRecord, UNMATCHED_LATENCY, correlate};
pub use load::{EventMap, LoadedStream, ScanReport, SkipReason, SkippedEntry, load};
pub use report::TextReport;
pub use summary::{LatencySummary, summarize};
