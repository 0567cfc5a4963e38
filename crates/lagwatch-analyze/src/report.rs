//! Human and machine-readable output for an [`Analysis`].

use crate::analysis::Analysis;
use crate::correlate::JoinedRecord;
use crate::load::ScanReport;
use std::fmt;
use std::io::{self, Write};

const RULE: &str = "══════════════════════════════════════════════════════════════════";

/// Text rendering of an [`Analysis`]: scan reports, then the latency summary.
pub struct TextReport<'a>(pub &'a Analysis);

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let analysis = self.0;

        writeln!(f, "{RULE}\nSCAN\n{RULE}\n")?;
        write_scan(f, &analysis.origin)?;
        write_scan(f, &analysis.confirmation)?;

        let s = &analysis.summary;
        writeln!(f, "{RULE}\nLATENCY\n{RULE}\n")?;
        writeln!(f, "Records:           {:>12}", s.total())?;
        writeln!(f, "Matched:           {:>12}", s.matched)?;
        writeln!(f, "Unmatched:         {:>12}", s.unmatched)?;
        if s.negative > 0 {
            writeln!(f, "Negative latency:  {:>12}", s.negative)?;
        }
        writeln!(f)?;
        writeln!(f, "Mean:              {:>12}", seconds(s.mean))?;
        writeln!(f, "Min:               {:>12}", seconds(s.min))?;
        writeln!(f, "Median:            {:>12}", seconds(s.median))?;
        writeln!(f, "p95:               {:>12}", seconds(s.p95))?;
        writeln!(f, "Max:               {:>12}", seconds(s.max))
    }
}

/// Render the scan reports and latency summary as text.
pub fn render_text(analysis: &Analysis) -> String {
    TextReport(analysis).to_string()
}

fn write_scan(f: &mut fmt::Formatter<'_>, report: &ScanReport) -> fmt::Result {
    writeln!(f, "{} stream", report.kind)?;
    writeln!(f, "  Scanned:         {:>12}", report.scanned)?;
    writeln!(f, "  Decoded:         {:>12}", report.decoded)?;
    writeln!(f, "  Skipped:         {:>12}", report.skipped.len())?;
    for (reason, count) in report.skip_counts() {
        writeln!(f, "    - {:<16} {:>8}", reason, count)?;
    }
    writeln!(f)
}

/// Format an optional number of seconds, `n/a` when undefined.
pub fn seconds(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.3}s"),
        None => "n/a".to_string(),
    }
}

/// Write one JSON object per record.
pub fn write_records<W: Write>(records: &[JoinedRecord], mut writer: W) -> io::Result<usize> {
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(records.len())
}
