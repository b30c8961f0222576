//! One-off local prediction and remote health commands

use anyhow::Result;
use efficiency_lib::predictor::PredictionService;
use efficiency_lib::StructuredLogger;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;

use crate::client::ApiClient;
use crate::output::{color_status, print_error, print_report, print_warning, FieldRow, OutputFormat};

/// Parse a `NAME=VALUE` argument
pub fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if name.trim().is_empty() {
        return Err(format!("empty field name in '{}'", raw));
    }
    Ok((name.trim().to_string(), value.to_string()))
}

/// Load the artifacts locally and classify one row
pub fn predict(
    logger: &StructuredLogger,
    scaler: &Path,
    model: &Path,
    fields: Vec<(String, String)>,
    format: OutputFormat,
) -> Result<()> {
    let service = PredictionService::load(scaler, model);
    let fields: HashMap<String, String> = fields.into_iter().collect();

    let started = Instant::now();
    match service.predict(&fields) {
        Ok(prediction) => {
            logger.log_prediction(&prediction, started.elapsed().as_micros() as u64);
            let rows = vec![
                FieldRow::new("Label", color_status(prediction.label)),
                FieldRow::new("Class id", prediction.class_id),
            ];
            print_report(&prediction, rows, format);
            Ok(())
        }
        Err(e) => {
            logger.log_rejection(&e);
            print_error(&format!("Error: {}", e));
            Err(e.into())
        }
    }
}

/// Fetch and print the health of a running server
pub async fn health(url: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::new(url)?;
    let health = client.health().await?;

    let rows = vec![
        FieldRow::new("Server", client.base_url()),
        FieldRow::new("Model loaded", health.model_loaded),
        FieldRow::new("Scaler loaded", health.scaler_loaded),
        FieldRow::new("Status", color_status(health.status.as_str())),
    ];
    print_report(&health, rows, format);

    if !health.is_healthy() && matches!(format, OutputFormat::Table) {
        print_warning("Server is running degraded");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("Temperature_C=75.0").unwrap(),
            ("Temperature_C".to_string(), "75.0".to_string())
        );
        assert_eq!(
            parse_field("Operation_Mode=").unwrap(),
            ("Operation_Mode".to_string(), String::new())
        );
        assert_eq!(parse_field("a=b=c").unwrap().1, "b=c");
        assert!(parse_field("Temperature_C").is_err());
        assert!(parse_field("=5").is_err());
    }
}
