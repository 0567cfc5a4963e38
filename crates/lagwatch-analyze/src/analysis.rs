//! One full read-path pass over the store.

use crate::correlate::{JoinedRecord, correlate};
use crate::load::{ScanReport, load};
use crate::summary::{LatencySummary, summarize};
use lagwatch_core::{CONFIRMATION_CODEC, EventStore, ORIGIN_CODEC, Result};
use metrics::gauge;
use serde::Serialize;
use tracing::info;

/// Everything a single analysis produced.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub origin: ScanReport,
    pub confirmation: ScanReport,
    #[serde(skip)]
    pub records: Vec<JoinedRecord>,
    pub summary: LatencySummary,
}

/// Load both streams, join them and summarize the result.
pub fn analyze<S: EventStore + ?Sized>(store: &S) -> Result<Analysis> {
    let origin = load(store, &ORIGIN_CODEC)?;
    let confirmation = load(store, &CONFIRMATION_CODEC)?;

    let records = correlate(&origin.events, &confirmation.events);
    let summary = summarize(&records);

    gauge!("correlate_records_matched").set(summary.matched as f64);
    gauge!("correlate_records_unmatched").set(summary.unmatched as f64);
    if let Some(mean) = summary.mean {
        gauge!("correlate_mean_latency_seconds").set(mean);
    }

    info!(
        "Correlated {} origin events: {} matched, {} unmatched",
        records.len(),
        summary.matched,
        summary.unmatched
    );

    Ok(Analysis {
        origin: origin.report,
        confirmation: confirmation.report,
        records,
        summary,
    })
}
