//! Record file writer
//!
//! Writes records as a pretty-printed JSON array (2-space indent) or as JSON
//! Lines.

use crate::error::{Error, Result};
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// File format for exported records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// One JSON array, pretty-printed
    #[default]
    Json,
    /// One compact JSON object per line
    #[serde(rename = "jsonl")]
    JsonLines,
}

impl ExportFormat {
    /// Infer from the file extension: `.jsonl`/`.ndjson` are JSON Lines, anything else JSON
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("jsonl" | "ndjson") => ExportFormat::JsonLines,
            _ => ExportFormat::Json,
        }
    }
}

/// Record writer.
///
/// JSON Lines rows go straight to the underlying writer. A JSON array is
/// buffered and printed on [`close`](Self::close).
pub struct RecordWriter<W: Write> {
    inner: W,
    format: ExportFormat,
    pending: Vec<Record>,
    rows_written: usize,
}

impl RecordWriter<BufWriter<File>> {
    /// Create `path` (and its parent directories) for writing
    pub fn create(path: impl AsRef<Path>, format: ExportFormat) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::output(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let file = File::create(path)
            .map_err(|e| Error::output(format!("Failed to create file: {e}")))?;
        Ok(Self::new(BufWriter::new(file), format))
    }
}

impl<W: Write> RecordWriter<W> {
    /// Wrap an existing writer
    pub fn new(inner: W, format: ExportFormat) -> Self {
        Self {
            inner,
            format,
            pending: Vec::new(),
            rows_written: 0,
        }
    }

    /// Append one record
    pub fn write(&mut self, record: &Record) -> Result<()> {
        match self.format {
            ExportFormat::Json => self.pending.push(record.clone()),
            ExportFormat::JsonLines => {
                serde_json::to_writer(&mut self.inner, record).map_err(write_error)?;
                self.inner.write_all(b"\n").map_err(write_error)?;
            }
        }

        self.rows_written += 1;
        Ok(())
    }

    /// Append every record in order
    pub fn write_all(&mut self, records: &[Record]) -> Result<()> {
        records.iter().try_for_each(|record| self.write(record))
    }

    /// Write `records` and close, without buffering a copy of them
    pub fn write_batch(mut self, records: &[Record]) -> Result<usize> {
        if self.format == ExportFormat::Json && self.pending.is_empty() {
            write_pretty(&mut self.inner, records)?;
            self.rows_written += records.len();
            return self.flush();
        }
        self.write_all(records)?;
        self.close()
    }

    /// Number of records written so far
    #[must_use]
    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Print the buffered JSON array if needed and flush
    pub fn close(mut self) -> Result<usize> {
        if self.format == ExportFormat::Json {
            let pending = std::mem::take(&mut self.pending);
            write_pretty(&mut self.inner, &pending)?;
        }
        self.flush()
    }

    fn flush(mut self) -> Result<usize> {
        self.inner
            .flush()
            .map_err(|e| Error::output(format!("Failed to flush output: {e}")))?;
        Ok(self.rows_written)
    }
}

/// Pretty JSON array with 2-space indent and a trailing newline
fn write_pretty<W: Write>(writer: &mut W, records: &[Record]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, records).map_err(write_error)?;
    writer.write_all(b"\n").map_err(write_error)
}

fn write_error(e: impl std::fmt::Display) -> Error {
    Error::output(format!("Failed to write records: {e}"))
}

/// Write `records` to any writer, returning the count written
pub fn write_records<W: Write>(
    writer: W,
    records: &[Record],
    format: ExportFormat,
) -> Result<usize> {
    RecordWriter::new(writer, format).write_batch(records)
}

/// Export `records` to `path`.
///
/// With no explicit format, the format is inferred from the extension.
pub fn export_records(
    records: &[Record],
    path: impl AsRef<Path>,
    format: Option<ExportFormat>,
) -> Result<usize> {
    let path = path.as_ref();
    let format = format.unwrap_or_else(|| ExportFormat::from_path(path));

    let rows = RecordWriter::create(path, format)?.write_batch(records)?;

    info!(path = %path.display(), records = rows, format = ?format, "Exported records");
    Ok(rows)
}
