//! Health reporting for the prediction service

use serde::{Deserialize, Serialize};

/// Overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    /// Model and scaler both loaded
    Healthy,
    /// At least one artifact missing
    Unhealthy,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Lifecycle state, fixed at startup.
///
/// A degraded service stays degraded until the process restarts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Ready,
    Degraded,
}

/// Health response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub model_loaded: bool,
    pub scaler_loaded: bool,
    pub status: ServiceStatus,
}

impl HealthStatus {
    pub fn new(model_loaded: bool, scaler_loaded: bool) -> Self {
        let status = if model_loaded && scaler_loaded {
            ServiceStatus::Healthy
        } else {
            ServiceStatus::Unhealthy
        };
        Self {
            model_loaded,
            scaler_loaded,
            status,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == ServiceStatus::Healthy
    }
}
