//! Raw telemetry loading from CSV

use crate::error::{Error, ErrorKind, Result};
use crate::models::RawRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Load raw telemetry records from a CSV file with a header row
pub fn load_records(path: &Path) -> Result<Vec<RawRecord>> {
    let file = File::open(path).map_err(|e| {
        Error::new(
            ErrorKind::DataLoad,
            format!("Failed to open raw data {}: {}", path.display(), e),
        )
        .with_source(e)
    })?;

    let records = read_records(file)?;
    info!(path = %path.display(), rows = records.len(), "Raw data loaded");
    Ok(records)
}

/// Read raw telemetry records from any CSV source
pub fn read_records<R: Read>(source: R) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut records = Vec::new();
    for (idx, result) in reader.deserialize().enumerate() {
        let record: RawRecord = result.map_err(|e| {
            Error::new(
                ErrorKind::DataLoad,
                format!("Malformed raw data at row {}: {}", idx + 1, e),
            )
        })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(Error::new(ErrorKind::DataLoad, "Raw data contains no rows"));
    }

    Ok(records)
}
