//! Structured event logging
//!
//! Consistent event names and fields for the batch stages and the
//! prediction server, emitted through `tracing`.

use crate::error::Error;
use crate::pipeline::PipelineReport;
use crate::predictor::{HealthStatus, Prediction};
use crate::trainer::TrainingReport;
use tracing::{error, info, warn};

/// Structured logger for domain events
#[derive(Debug, Clone)]
pub struct StructuredLogger {
    component: String,
}

impl StructuredLogger {
    pub fn new(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    /// Log service startup with the artifact state it came up in
    pub fn log_startup(&self, version: &str, health: &HealthStatus) {
        if health.is_healthy() {
            info!(
                event = "service_started",
                component = %self.component,
                version = %version,
                model_loaded = health.model_loaded,
                scaler_loaded = health.scaler_loaded,
                "Prediction service started"
            );
        } else {
            warn!(
                event = "service_started",
                component = %self.component,
                version = %version,
                model_loaded = health.model_loaded,
                scaler_loaded = health.scaler_loaded,
                "Prediction service started degraded"
            );
        }
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            component = %self.component,
            reason = %reason,
            "Prediction service shutting down"
        );
    }

    pub fn log_prediction(&self, prediction: &Prediction, elapsed_us: u64) {
        info!(
            event = "prediction_served",
            component = %self.component,
            class_id = prediction.class_id,
            label = prediction.label,
            elapsed_us = elapsed_us,
            "Prediction served"
        );
    }

    pub fn log_rejection(&self, err: &Error) {
        warn!(
            event = "prediction_rejected",
            component = %self.component,
            kind = %err.kind(),
            field = ?err.field(),
            error = %err,
            "Prediction request rejected"
        );
    }

    pub fn log_timeout(&self, timeout_ms: u128) {
        warn!(
            event = "prediction_timeout",
            component = %self.component,
            timeout_ms = timeout_ms as u64,
            "Prediction exceeded its time budget"
        );
    }

    pub fn log_pipeline_completed(&self, report: &PipelineReport) {
        info!(
            event = "pipeline_completed",
            component = %self.component,
            rows_loaded = report.rows_loaded,
            rows_dropped = report.rows_dropped,
            train_rows = report.train_rows,
            test_rows = report.test_rows,
            low = report.class_counts[0],
            medium = report.class_counts[1],
            high = report.class_counts[2],
            "Data processing pipeline completed"
        );
    }

    pub fn log_training_completed(&self, report: &TrainingReport) {
        info!(
            event = "training_completed",
            component = %self.component,
            model_path = %report.model_path.display(),
            iterations = report.iterations,
            converged = report.converged,
            accuracy = report.metrics.accuracy,
            f1 = report.metrics.f1,
            "Model training and evaluation completed"
        );
    }

    /// Log a failed batch stage; unexpected kinds carry their source chain
    pub fn log_stage_failure(&self, err: &Error) {
        let stage = err.stage().map(|s| s.as_str()).unwrap_or("unknown");
        if err.is_expected() {
            error!(
                event = "stage_failed",
                component = %self.component,
                stage = stage,
                kind = %err.kind(),
                error = %err,
                "Stage failed"
            );
        } else {
            let mut chain = Vec::new();
            let mut source = std::error::Error::source(err);
            while let Some(s) = source {
                chain.push(s.to_string());
                source = std::error::Error::source(s);
            }
            error!(
                event = "stage_failed_unexpected",
                component = %self.component,
                stage = stage,
                kind = %err.kind(),
                error = %err,
                causes = ?chain,
                "Unexpected stage failure"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, Stage};

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("efficiency-server");
        assert_eq!(logger.component(), "efficiency-server");
    }

    #[test]
    fn test_logging_without_subscriber_is_noop() {
        let logger = StructuredLogger::new("test");
        logger.log_startup("0.1.0", &HealthStatus::new(false, true));
        logger.log_rejection(&Error::missing_field("Hour"));
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        logger.log_stage_failure(&Error::from(io).with_stage(Stage::FeaturePipeline));
        logger.log_stage_failure(
            &Error::new(ErrorKind::DataLoad, "bad").with_stage(Stage::FeaturePipeline),
        );
    }
}
