//! JSONL producer source.
//!
//! The load generator records each successful zone operation as one JSON
//! line:
//!
//! ```text
//! {"operation":"create","response":{"zone":{"name":"acme.com.","serial":1,"created_at":"..."}}}
//! ```
//!
//! Lines that fail to parse are logged and counted, never fatal.

use crate::payload::{BufferedItem, Operation, ZoneOperationResult};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One producer output line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerRecord {
    pub operation: Operation,
    pub response: ZoneOperationResult,
}

impl From<ProducerRecord> for BufferedItem {
    fn from(record: ProducerRecord) -> Self {
        BufferedItem::new(record.operation, record.response)
    }
}

/// Statistics from reading a producer stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceStats {
    /// Non-empty lines read.
    pub total_lines: usize,

    /// Lines handed to the handler.
    pub records: usize,

    /// Lines that failed to parse.
    pub parse_errors: usize,
}

/// Reads [`ProducerRecord`]s from a line-oriented reader.
pub struct JsonlProducer<R: BufRead> {
    reader: R,
    label: String,
}

impl JsonlProducer<BufReader<File>> {
    /// Open a JSONL file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

impl<R: BufRead> JsonlProducer<R> {
    /// Wrap any buffered reader; `label` names it in logs.
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
        }
    }

    /// Parse a single line.
    pub fn parse_line(line: &str, line_num: usize) -> Result<ProducerRecord> {
        serde_json::from_str(line).map_err(|e| Error::Source {
            line: line_num,
            reason: e.to_string(),
        })
    }

    /// Feed every record to `handler` until input ends or it returns `Ok(false)`.
    pub fn process<F>(&mut self, mut handler: F) -> Result<SourceStats>
    where
        F: FnMut(BufferedItem) -> Result<bool>,
    {
        let mut stats = SourceStats::default();
        let mut line = String::new();
        let mut line_num = 0usize;

        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                break;
            }
            line_num += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            stats.total_lines += 1;

            let record = match Self::parse_line(trimmed, line_num) {
                Ok(record) => record,
                Err(e) => {
                    tracing::warn!("{}: {}", self.label, e);
                    stats.parse_errors += 1;
                    continue;
                }
            };

            stats.records += 1;
            if !handler(record.into())? {
                tracing::info!("{}: handler signaled stop", self.label);
                break;
            }
        }

        tracing::info!(
            "{}: {} lines, {} records, {} parse errors",
            self.label,
            stats.total_lines,
            stats.records,
            stats.parse_errors
        );

        Ok(stats)
    }
}
