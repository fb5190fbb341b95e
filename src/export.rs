//! Tabular export of canonical records.
//!
//! UTF-8 CSV with the fixed 16-column schema ([`crate::records::EXPORT_COLUMNS`]),
//! so the bilingual (Latin + Thai) label text round-trips losslessly. The
//! write is all-or-nothing: rows stream into a temp file in the destination
//! directory, which is persisted over the target only once every record is
//! flushed — a failed export never leaves a truncated file behind.

use std::path::Path;

use thiserror::Error;

use crate::records::CanonicalRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("destination unwritable: {0}")]
    Io(#[from] std::io::Error),

    #[error("record serialization failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Write `records` to `path`, creating parent directories as needed.
pub fn write_csv(records: &[CanonicalRecord], path: &Path) -> Result<(), ExportError> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(parent) = parent {
        std::fs::create_dir_all(parent)?;
    }

    let mut staging = tempfile::NamedTempFile::new_in(parent.unwrap_or_else(|| Path::new(".")))?;
    {
        let mut writer = csv::Writer::from_writer(&mut staging);
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
    }
    staging.persist(path).map_err(|e| ExportError::Io(e.error))?;
    Ok(())
}

/// Read an export back into canonical records. Used by the summary API and
/// the round-trip tests.
pub fn read_csv(path: &Path) -> Result<Vec<CanonicalRecord>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut records = Vec::new();
    for row in reader.deserialize() {
        records.push(row?);
    }
    Ok(records)
}
