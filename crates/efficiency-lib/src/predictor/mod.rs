//! Online prediction
//!
//! The prediction service is built once at startup from the scaler and
//! model artifacts and is read-only afterwards, so it can be shared across
//! request handlers without locking.

mod health;
mod service;

pub use health::{HealthStatus, ServiceState, ServiceStatus};
pub use service::{Prediction, PredictionService};

use crate::error::Result;

/// Trait for fitted classifiers
pub trait Classifier: Send + Sync {
    /// Class id for one scaled feature row
    fn predict_class(&self, features: &[f64]) -> Result<i64>;
}
