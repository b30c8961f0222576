//! Temporal feature derivation and categorical encoding

use super::encoding::EncodingTables;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{EfficiencyLabel, FeatureVector, RawRecord, NUM_FEATURES, OPERATION_MODE_INDEX};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use tracing::{info, warn};

const TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Records turned into model-ready feature rows
#[derive(Debug, Clone)]
pub struct ProcessedDataset {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<EfficiencyLabel>,
    pub encoding: EncodingTables,
    /// Rows dropped because their timestamp did not parse
    pub dropped_rows: usize,
}

impl ProcessedDataset {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Row count per label, indexed by label code
    pub fn class_counts(&self) -> [usize; 3] {
        let mut counts = [0; 3];
        for label in &self.labels {
            counts[label.code()] += 1;
        }
        counts
    }
}

/// Year, month, day and hour derived from a timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeFeatures {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
}

impl From<NaiveDateTime> for TimeFeatures {
    fn from(dt: NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
        }
    }
}

/// Parse a raw timestamp, returning None when no supported format matches
pub fn parse_timestamp(raw: &str) -> Option<TimeFeatures> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().into());
    }
    for format in TIMESTAMP_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.into());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(TimeFeatures::from)
}

/// Derive features and encode labels for every record.
///
/// Rows with an unparseable timestamp are dropped. A missing or non-finite
/// sensor value, an empty operation mode or an unknown label fails the
/// whole run.
pub fn preprocess(records: &[RawRecord]) -> Result<ProcessedDataset> {
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped_rows = 0;

    for (idx, record) in records.iter().enumerate() {
        let row = idx + 1;
        let Some(time) = parse_timestamp(&record.timestamp) else {
            dropped_rows += 1;
            continue;
        };

        if record.operation_mode.is_empty() {
            return Err(Error::new(
                ErrorKind::Preprocessing,
                format!("Missing Operation_Mode at row {}", row),
            ));
        }

        let label = EfficiencyLabel::parse(&record.efficiency_status).ok_or_else(|| {
            Error::new(
                ErrorKind::UnknownLabel,
                format!(
                    "Unknown Efficiency_Status '{}' at row {}",
                    record.efficiency_status, row
                ),
            )
        })?;

        let mut values = [0.0; NUM_FEATURES];
        for (offset, (name, value)) in record.sensor_values().into_iter().enumerate() {
            values[offset + 1] = match value {
                Some(v) if v.is_finite() => v,
                Some(v) => {
                    return Err(Error::new(
                        ErrorKind::Preprocessing,
                        format!("Non-finite value {} for {} at row {}", v, name, row),
                    ))
                }
                None => {
                    return Err(Error::new(
                        ErrorKind::Preprocessing,
                        format!("Missing value for {} at row {}", name, row),
                    ))
                }
            };
        }
        values[10] = time.year as f64;
        values[11] = time.month as f64;
        values[12] = time.day as f64;
        values[13] = time.hour as f64;

        kept.push((record.operation_mode.as_str(), values, label));
    }

    if dropped_rows > 0 {
        warn!(dropped_rows, "Dropped rows with unparseable timestamps");
    }
    if kept.is_empty() {
        return Err(Error::new(
            ErrorKind::Preprocessing,
            "No rows left after timestamp parsing",
        ));
    }

    let encoding = EncodingTables::fit(kept.iter().map(|(mode, _, _)| *mode));

    let mut features = Vec::with_capacity(kept.len());
    let mut labels = Vec::with_capacity(kept.len());
    for (mode, mut values, label) in kept {
        // every mode is in the table it was just fit on
        let code = encoding.encode_operation_mode(mode).unwrap_or_default();
        values[OPERATION_MODE_INDEX] = code as f64;
        features.push(FeatureVector::new(values));
        labels.push(label);
    }

    info!(
        rows = labels.len(),
        dropped_rows,
        operation_modes = encoding.operation_modes().len(),
        "Preprocessing completed"
    );

    Ok(ProcessedDataset {
        features,
        labels,
        encoding,
        dropped_rows,
    })
}
