//! Destinations for per-window metric records.

use crate::pipeline::Outcome;
use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::io::Write;

/// One processed recording window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    /// End of the window relative to the start of the stream.
    pub timestamp_ms: u64,
    pub outcome: Outcome,
}

pub trait MetricSink {
    fn write(&mut self, record: &MetricRecord) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

pub const CSV_HEADER: [&str; 6] = [
    "timestamp_ms",
    "status",
    "heart_rate_bpm",
    "sdnn_ms",
    "rmssd_ms",
    "reason",
];

/// Comma-separated rows. Metrics that were not computed are left empty.
pub struct CsvMetricSink<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> CsvMetricSink<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(inner);
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("flushing metric csv: {}", e.error()))
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.3}")).unwrap_or_default()
}

impl<W: Write> MetricSink for CsvMetricSink<W> {
    fn write(&mut self, record: &MetricRecord) -> Result<()> {
        let metrics = record.outcome.metrics();
        self.writer
            .write_record([
                record.timestamp_ms.to_string(),
                record.outcome.status().to_string(),
                cell(metrics.map(|m| m.heart_rate_bpm)),
                cell(metrics.map(|m| m.sdnn_ms)),
                cell(metrics.and_then(|m| m.rmssd_ms)),
                record
                    .outcome
                    .reason()
                    .map(|r| r.code().to_string())
                    .unwrap_or_default(),
            ])
            .with_context(|| format!("writing metric row at {} ms", record.timestamp_ms))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("flushing metric csv")
    }
}

/// One JSON object per line.
pub struct JsonLinesSink<W: Write> {
    inner: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> MetricSink for JsonLinesSink<W> {
    fn write(&mut self, record: &MetricRecord) -> Result<()> {
        serde_json::to_writer(&mut self.inner, record)?;
        self.inner.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush().context("flushing metric stream")
    }
}
