//! Export collaborator: serialize computed sequences to CSV or JSON.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::record::{Record, RawValue};

/// Write records as CSV using the given column order. Absent cells render
/// as empty fields.
pub fn write_records_csv<W: Write>(
    writer: W,
    headers: &[String],
    records: &[Record],
) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(headers)?;

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|h| record.get(h).map(RawValue::to_string).unwrap_or_default())
            .collect();
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_records_csv(path: &Path, headers: &[String], records: &[Record]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;
    write_records_csv(file, headers, records)?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn export_records_json(path: &Path, records: &[Record]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)
        .with_context(|| format!("failed to write export file {}", path.display()))?;
    info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}
