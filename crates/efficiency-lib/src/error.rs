//! Error types shared by all stages
//!
//! Every failure carries a kind, a human-readable message and, once it has
//! crossed a stage boundary, the stage it originated in. Callers decide what
//! to do with it; nothing in this crate logs and swallows an error.

use std::fmt;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Raw source unreadable or malformed
    DataLoad,
    /// Schema mismatch or missing value in the raw data
    Preprocessing,
    /// Target label outside {Low, Medium, High}
    UnknownLabel,
    /// Expected artifact absent at load time
    ArtifactMissing,
    /// Artifact present but undecodable or failing its checksum
    ArtifactCorrupt,
    /// Artifact written for a different feature list
    SchemaMismatch,
    /// Another pipeline run holds the artifact directory
    ConcurrentRun,
    /// Model fitting failed
    Training,
    /// Malformed or missing inference input field
    Validation,
    /// Required artifact not loaded at serving time
    ServiceUnavailable,
    /// Filesystem failure outside artifact loading
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DataLoad => "data_load",
            ErrorKind::Preprocessing => "preprocessing",
            ErrorKind::UnknownLabel => "unknown_label",
            ErrorKind::ArtifactMissing => "artifact_missing",
            ErrorKind::ArtifactCorrupt => "artifact_corrupt",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::ConcurrentRun => "concurrent_run",
            ErrorKind::Training => "training",
            ErrorKind::Validation => "validation",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage a failure originated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FeaturePipeline,
    ModelTrainer,
    Inference,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::FeaturePipeline => "feature_pipeline",
            Stage::ModelTrainer => "model_trainer",
            Stage::Inference => "inference",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised by any stage
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Error {
    kind: ErrorKind,
    message: String,
    stage: Option<Stage>,
    field: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: None,
            field: None,
            source: None,
        }
    }

    /// Validation failure attributed to a single input field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        let mut err = Self::new(ErrorKind::Validation, message);
        err.field = Some(field.to_string());
        err
    }

    pub fn missing_field(field: &str) -> Self {
        Self::validation(field, format!("Missing value for {}", field))
    }

    pub fn artifact_missing(name: &str) -> Self {
        Self::new(
            ErrorKind::ArtifactMissing,
            format!("Artifact '{}' not found", name),
        )
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Attach the originating stage unless one is already recorded
    pub fn with_stage(mut self, stage: Stage) -> Self {
        self.stage.get_or_insert(stage);
        self
    }

    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Input field the error refers to, for validation failures
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// True for the failure kinds the stages anticipate and report as such.
    ///
    /// Io and Training failures are treated as unexpected.
    pub fn is_expected(&self) -> bool {
        !matches!(self.kind, ErrorKind::Io | ErrorKind::Training)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::Io, err.to_string()).with_source(err)
    }
}
