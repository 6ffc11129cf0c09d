//! Sample sinks.
//!
//! The persistence format is not part of the timestamping contract; these writers exist so
//! the CLI and tests have somewhere to put records.
use crate::error::{AppResult, DaqError};
use crate::measurement_types::SampleRecord;
use crate::metadata::SessionMetadata;
use std::io::Write;
use tracing::info;

/// Trait for anything that accepts emitted records.
pub trait SampleSink {
    /// Writes a batch of records.
    fn write(&mut self, records: &[SampleRecord]) -> AppResult<()>;

    /// Flushes and finalizes the sink.
    fn finish(&mut self) -> AppResult<()>;
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<SampleRecord>,
    finished: bool,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records collected so far.
    pub fn records(&self) -> &[SampleRecord] {
        &self.records
    }

    /// Whether `finish` was called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes the sink, returning the records.
    pub fn into_records(self) -> Vec<SampleRecord> {
        self.records
    }
}

impl SampleSink for MemorySink {
    fn write(&mut self, records: &[SampleRecord]) -> AppResult<()> {
        self.records.extend_from_slice(records);
        Ok(())
    }

    fn finish(&mut self) -> AppResult<()> {
        self.finished = true;
        Ok(())
    }
}

/// A writer for CSV output.
///
/// Session metadata is written first as `# `-prefixed JSON lines, followed by the
/// `timestamp,timestamp_utc,channel,voltage` header.
#[derive(Debug)]
pub struct CsvSink<W: Write> {
    writer: Option<csv::Writer<W>>,
    include_utc: bool,
    rows: u64,
}

impl<W: Write> CsvSink<W> {
    /// Validates the metadata, then writes it and the column header to `out`.
    pub fn new(mut out: W, metadata: &SessionMetadata, include_utc: bool) -> AppResult<Self> {
        metadata.validate()?;
        let json_string = serde_json::to_string_pretty(metadata)?;
        for line in json_string.lines() {
            out.write_all(b"# ")?;
            out.write_all(line.as_bytes())?;
            out.write_all(b"\n")?;
        }

        let mut writer = csv::Writer::from_writer(out);
        if include_utc {
            writer.write_record(["timestamp", "timestamp_utc", "channel", "voltage"])?;
        } else {
            writer.write_record(["timestamp", "channel", "voltage"])?;
        }

        Ok(Self {
            writer: Some(writer),
            include_utc,
            rows: 0,
        })
    }

    /// Rows written so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Finishes and returns the underlying writer.
    pub fn into_inner(mut self) -> AppResult<Option<W>> {
        match self.writer.take() {
            Some(writer) => writer
                .into_inner()
                .map(Some)
                .map_err(|e| DaqError::Io(e.into_error())),
            None => Ok(None),
        }
    }
}

impl<W: Write> SampleSink for CsvSink<W> {
    fn write(&mut self, records: &[SampleRecord]) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            for record in records {
                let timestamp = format!("{:.6}", record.timestamp);
                let channel = record.channel.to_string();
                let voltage = record.voltage.to_string();
                if self.include_utc {
                    let utc = record.timestamp_utc().to_rfc3339();
                    writer.write_record([&timestamp, &utc, &channel, &voltage])?;
                } else {
                    writer.write_record([&timestamp, &channel, &voltage])?;
                }
                self.rows += 1;
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> AppResult<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            info!(rows = self.rows, "CSV sink flushed");
        }
        Ok(())
    }
}
