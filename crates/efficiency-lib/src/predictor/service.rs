//! Prediction service over the frozen transform and fitted model

use super::health::{HealthStatus, ServiceState};
use super::Classifier;
use crate::artifacts::load_artifact;
use crate::error::{Error, ErrorKind, Result, Stage};
use crate::models::{
    label_for_class, FeatureVector, FEATURE_NAMES, NUM_FEATURES, OPERATION_MODE,
    OPERATION_MODE_INDEX,
};
use crate::pipeline::{EncodingTables, FeatureTransform};
use crate::trainer::LogisticRegression;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info};

/// Result of one classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prediction {
    pub class_id: i64,
    /// "Low", "Medium", "High" or the invalid-prediction sentinel
    pub label: &'static str,
}

/// Loaded artifacts plus the request path that uses them
pub struct PredictionService {
    transform: Option<FeatureTransform>,
    model: Option<Box<dyn Classifier>>,
}

impl PredictionService {
    pub fn new(transform: Option<FeatureTransform>, model: Option<Box<dyn Classifier>>) -> Self {
        Self { transform, model }
    }

    /// Load both artifacts. Never fails: an artifact that cannot be loaded
    /// is logged and left absent, and the service starts degraded.
    pub fn load(scaler_path: &Path, model_path: &Path) -> Self {
        let transform = match load_artifact::<FeatureTransform>(scaler_path) {
            Ok(t) => {
                info!(path = %scaler_path.display(), "Scaler loaded");
                Some(t)
            }
            Err(e) => {
                error!(
                    event = "artifact_load_failed",
                    path = %scaler_path.display(),
                    kind = %e.kind(),
                    error = %e,
                    "Failed to load scaler"
                );
                None
            }
        };

        let model = match load_model(model_path) {
            Ok(m) => {
                info!(path = %model_path.display(), "Model loaded");
                Some(Box::new(m) as Box<dyn Classifier>)
            }
            Err(e) => {
                error!(
                    event = "artifact_load_failed",
                    path = %model_path.display(),
                    kind = %e.kind(),
                    error = %e,
                    "Failed to load model"
                );
                None
            }
        };

        Self::new(transform, model)
    }

    pub fn state(&self) -> ServiceState {
        if self.transform.is_some() && self.model.is_some() {
            ServiceState::Ready
        } else {
            ServiceState::Degraded
        }
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::new(self.model.is_some(), self.transform.is_some())
    }

    /// Operation modes accepted by name, empty when the scaler is absent
    pub fn operation_modes(&self) -> &[String] {
        self.transform
            .as_ref()
            .map(|t| t.encoding.operation_modes())
            .unwrap_or(&[])
    }

    /// Classify one row given as feature name to raw string value.
    ///
    /// Checks run in order: every field present, numeric fields parse,
    /// artifacts loaded, operation mode known.
    pub fn predict(&self, fields: &HashMap<String, String>) -> Result<Prediction> {
        self.predict_inner(fields)
            .map_err(|e| e.with_stage(Stage::Inference))
    }

    fn predict_inner(&self, fields: &HashMap<String, String>) -> Result<Prediction> {
        let mut raw = [""; NUM_FEATURES];
        for (slot, name) in raw.iter_mut().zip(FEATURE_NAMES) {
            match fields.get(name).map(|v| v.trim()) {
                Some(v) if !v.is_empty() => *slot = v,
                _ => return Err(Error::missing_field(name)),
            }
        }

        let mut values = [0.0; NUM_FEATURES];
        for (idx, name) in FEATURE_NAMES.iter().enumerate() {
            if idx != OPERATION_MODE_INDEX {
                values[idx] = parse_number(name, raw[idx])?;
            }
        }

        let (transform, model) = match (&self.transform, &self.model) {
            (Some(t), Some(m)) => (t, m),
            _ => {
                return Err(Error::service_unavailable(
                    "Model or scaler not loaded properly",
                ))
            }
        };

        values[OPERATION_MODE_INDEX] =
            resolve_operation_mode(&transform.encoding, raw[OPERATION_MODE_INDEX])?;

        let scaled = transform.scale(&FeatureVector::new(values));
        let class_id = model.predict_class(scaled.values())?;
        let prediction = Prediction {
            class_id,
            label: label_for_class(class_id),
        };

        debug!(class_id, label = prediction.label, "Prediction computed");
        Ok(prediction)
    }
}

fn load_model(path: &Path) -> Result<LogisticRegression> {
    let model: LogisticRegression = load_artifact(path)?;
    if model.n_features() != NUM_FEATURES {
        return Err(Error::new(
            ErrorKind::SchemaMismatch,
            format!(
                "Model at {} expects {} features, expected {}",
                path.display(),
                model.n_features(),
                NUM_FEATURES
            ),
        ));
    }
    Ok(model)
}

fn parse_number(name: &str, raw: &str) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(Error::validation(
            name,
            format!("Invalid value for {}: '{}' is not a number", name, raw),
        )),
    }
}

/// Known category name, or an integer code assigned by the table.
/// Anything else is rejected.
fn resolve_operation_mode(encoding: &EncodingTables, raw: &str) -> Result<f64> {
    if let Some(code) = encoding.encode_operation_mode(raw) {
        return Ok(code as f64);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && encoding.is_valid_code(v as usize) => Ok(v),
        Ok(_) => Err(Error::validation(
            OPERATION_MODE,
            format!(
                "Invalid value for {}: code {} is not in the encoding table",
                OPERATION_MODE, raw
            ),
        )),
        Err(_) => Err(Error::validation(
            OPERATION_MODE,
            format!(
                "Invalid value for {}: unknown category '{}'",
                OPERATION_MODE, raw
            ),
        )),
    }
}
