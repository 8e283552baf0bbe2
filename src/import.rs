//! Tabular import collaborator.
//!
//! Reads a delimited sheet export: the first row is the header, every
//! following row is positionally assigned to the header names. Cells that
//! parse as numbers become numeric; empty cells are treated as absent so
//! the schema stays implicit per record.

use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::record::{Dataset, RawValue, Record};

pub fn import_csv(path: &Path) -> Result<Dataset> {
    let file = File::open(path)
        .with_context(|| format!("failed to open import file {}", path.display()))?;
    let dataset = read_records(file)
        .with_context(|| format!("failed to parse import file {}", path.display()))?;

    info!(
        "Imported {} records ({} columns) from {}",
        dataset.len(),
        dataset.headers.len(),
        path.display()
    );
    Ok(dataset)
}

/// Parse delimited rows from any reader. Fails when the input holds no
/// data rows, mirroring how an empty sheet upload is rejected.
pub fn read_records<R: Read>(reader: R) -> Result<Dataset> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()
        .context("import is missing a header row")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.context("unreadable row in import")?;
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            record.set(header.clone(), parse_cell(cell));
        }
        records.push(record);
    }

    if records.is_empty() {
        bail!("import contains no data rows");
    }

    Ok(Dataset::new(headers, records))
}

fn parse_cell(cell: &str) -> RawValue {
    match cell.trim().parse::<f64>() {
        Ok(n) => RawValue::Number(n),
        Err(_) => RawValue::Text(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SHEET: &str = "\
Wallet,ROI,PNL,AVG Trade Duration,AVG Mcap First Tx
walletA,0.8,55,2 hours,6.2k
walletB,0.3,,45 minutes,1.5m
walletC,,-12,,
";

    #[test]
    fn test_header_row_maps_positionally() {
        let dataset = read_records(Cursor::new(SHEET)).unwrap();
        assert_eq!(dataset.headers.len(), 5);
        assert_eq!(dataset.len(), 3);

        let first = &dataset.records[0];
        assert_eq!(first.wallet(), Some("walletA"));
        assert_eq!(first.get("ROI"), Some(&RawValue::Number(0.8)));
        // Suffixed magnitudes stay textual; normalization happens later.
        assert_eq!(
            first.get("AVG Mcap First Tx"),
            Some(&RawValue::Text("6.2k".into()))
        );
    }

    #[test]
    fn test_empty_cells_are_absent() {
        let dataset = read_records(Cursor::new(SHEET)).unwrap();
        let second = &dataset.records[1];
        assert_eq!(second.get("PNL"), None);

        let third = &dataset.records[2];
        assert_eq!(third.get("ROI"), None);
        assert_eq!(third.get("PNL"), Some(&RawValue::Number(-12.0)));
    }

    #[test]
    fn test_header_only_input_is_an_error() {
        let result = read_records(Cursor::new("Wallet,ROI\n"));
        assert!(result.is_err());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let dataset = read_records(Cursor::new("A,B,C\n1,2\n")).unwrap();
        let record = &dataset.records[0];
        assert_eq!(record.get("A"), Some(&RawValue::Number(1.0)));
        assert_eq!(record.get("C"), None);
    }
}
