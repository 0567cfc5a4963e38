//! Latency statistics over joined records.

use crate::correlate::JoinedRecord;
use serde::Serialize;

/// Aggregate latency over one analysis run.
///
/// Statistics cover matched records only and are `None` when nothing
/// matched. Percentiles use the nearest-rank method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub matched: usize,
    pub unmatched: usize,

    /// Matched records whose confirmation predates the origin.
    pub negative: usize,

    pub mean: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub p95: Option<f64>,
}

impl LatencySummary {
    pub fn total(&self) -> usize {
        self.matched + self.unmatched
    }
}

pub fn summarize(records: &[JoinedRecord]) -> LatencySummary {
    let mut latencies: Vec<f64> = records
        .iter()
        .filter(|r| r.is_matched())
        .map(|r| r.latency)
        .collect();
    latencies.sort_by(f64::total_cmp);

    let matched = latencies.len();
    let mean = (matched > 0).then(|| latencies.iter().sum::<f64>() / matched as f64);

    LatencySummary {
        matched,
        unmatched: records.len() - matched,
        negative: latencies.iter().filter(|l| **l < 0.0).count(),
        mean,
        min: latencies.first().copied(),
        max: latencies.last().copied(),
        median: nearest_rank(&latencies, 50.0),
        p95: nearest_rank(&latencies, 95.0),
    }
}

/// Nearest-rank percentile of an ascending slice.
fn nearest_rank(sorted: &[f64], percentile: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (percentile / 100.0 * sorted.len() as f64).ceil() as usize;
    Some(sorted[rank.clamp(1, sorted.len()) - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::UNMATCHED_LATENCY;
    use chrono::NaiveDate;

    fn record(serial: u64, latency: Option<f64>) -> JoinedRecord {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap();
        JoinedRecord {
            serial,
            zone: "acme.com.".to_string(),
            origin_timestamp: origin,
            confirmation_timestamp: latency.map(|_| origin),
            latency: latency.unwrap_or(UNMATCHED_LATENCY),
        }
    }

    #[test]
    fn test_mean_over_matched_only() {
        let records = vec![
            record(1, Some(10.0)),
            record(2, None),
            record(3, Some(30.0)),
            record(4, None),
        ];

        let summary = summarize(&records);

        assert_eq!(summary.matched, 2);
        assert_eq!(summary.unmatched, 2);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.mean, Some(20.0));
        assert_eq!(summary.min, Some(10.0));
        assert_eq!(summary.max, Some(30.0));
    }

    #[test]
    fn test_nothing_matched_is_undefined() {
        let records = vec![record(1, None), record(2, None)];

        let summary = summarize(&records);

        assert_eq!(summary.matched, 0);
        assert_eq!(summary.unmatched, 2);
        assert_eq!(summary.mean, None);
        assert_eq!(summary.median, None);
        assert_eq!(summary.p95, None);
    }

    #[test]
    fn test_empty_input() {
        let summary = summarize(&[]);
        assert_eq!(summary, LatencySummary::default());
    }

    #[test]
    fn test_percentiles_nearest_rank() {
        let records: Vec<_> = (1..=20)
            .map(|i| record(i, Some(i as f64)))
            .collect();

        let summary = summarize(&records);

        assert_eq!(summary.median, Some(10.0));
        assert_eq!(summary.p95, Some(19.0));
        assert_eq!(summary.mean, Some(10.5));
    }

    #[test]
    fn test_single_record_percentiles() {
        let summary = summarize(&[record(1, Some(42.0))]);
        assert_eq!(summary.median, Some(42.0));
        assert_eq!(summary.p95, Some(42.0));
    }

    #[test]
    fn test_negative_counted_not_clamped() {
        let records = vec![record(1, Some(-5.0)), record(2, Some(15.0))];

        let summary = summarize(&records);

        assert_eq!(summary.negative, 1);
        assert_eq!(summary.min, Some(-5.0));
        assert_eq!(summary.mean, Some(5.0));
    }
}
