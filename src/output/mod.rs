//! Output module
//!
//! Exports accumulated records to files as a JSON array or JSON Lines.

mod writer;

pub use writer::{export_records, write_records, ExportFormat, RecordWriter};
