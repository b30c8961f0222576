//! Model trainer
//!
//! Loads the split artifacts, fits the classifier, persists it and scores
//! it on the test split. The model is written regardless of its scores.

mod logistic;
mod metrics;

pub use logistic::{LogisticRegression, TrainingConfig};
pub use metrics::{evaluate, EvaluationMetrics};

use crate::artifacts::{names, ArtifactStore};
use crate::error::{Error, ErrorKind, Result, Stage};
use crate::models::{EfficiencyLabel, NUM_FEATURES};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// The four split artifacts
#[derive(Debug, Clone)]
pub struct SplitArtifacts {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Array1<usize>,
    pub y_test: Array1<usize>,
}

/// Summary of a completed training run
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub model_path: PathBuf,
    pub train_rows: usize,
    pub test_rows: usize,
    pub iterations: usize,
    pub converged: bool,
    pub metrics: EvaluationMetrics,
}

pub struct ModelTrainer {
    processed: ArtifactStore,
    models: ArtifactStore,
    config: TrainingConfig,
}

impl ModelTrainer {
    pub fn new(processed_dir: impl Into<PathBuf>, model_dir: impl Into<PathBuf>) -> Self {
        Self {
            processed: ArtifactStore::new(processed_dir),
            models: ArtifactStore::new(model_dir),
            config: TrainingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: TrainingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn model_path(&self) -> PathBuf {
        self.models.path(names::MODEL)
    }

    pub fn model_dir(&self) -> &Path {
        self.models.dir()
    }

    /// Read the four split artifacts
    pub fn load(&self) -> Result<SplitArtifacts> {
        let data = SplitArtifacts {
            x_train: self.processed.load(names::X_TRAIN)?,
            x_test: self.processed.load(names::X_TEST)?,
            y_train: self.processed.load(names::Y_TRAIN)?,
            y_test: self.processed.load(names::Y_TEST)?,
        };

        for (name, x, y) in [
            (names::X_TRAIN, &data.x_train, &data.y_train),
            (names::X_TEST, &data.x_test, &data.y_test),
        ] {
            if x.ncols() != NUM_FEATURES {
                return Err(Error::new(
                    ErrorKind::SchemaMismatch,
                    format!("{} has {} columns, expected {}", name, x.ncols(), NUM_FEATURES),
                ));
            }
            if x.nrows() != y.len() {
                return Err(Error::new(
                    ErrorKind::ArtifactCorrupt,
                    format!("{} has {} rows but {} labels", name, x.nrows(), y.len()),
                ));
            }
        }

        info!(
            train_rows = data.x_train.nrows(),
            test_rows = data.x_test.nrows(),
            "Split artifacts loaded"
        );
        Ok(data)
    }

    /// Fit the classifier and persist it
    pub fn train(&self, data: &SplitArtifacts) -> Result<LogisticRegression> {
        let model = LogisticRegression::fit(
            &data.x_train,
            &data.y_train,
            EfficiencyLabel::ALL.len(),
            &self.config,
        )?;
        self.models.save(names::MODEL, &model)?;

        info!(
            iterations = model.n_iter(),
            converged = model.converged(),
            path = %self.model_path().display(),
            "Model trained and saved"
        );
        Ok(model)
    }

    /// Score the model on the test split, log and record the metrics
    pub fn evaluate(
        &self,
        model: &LogisticRegression,
        data: &SplitArtifacts,
    ) -> Result<EvaluationMetrics> {
        let predicted = model.predict(&data.x_test);
        let metrics = evaluate(
            &data.y_test.to_vec(),
            &predicted.to_vec(),
            EfficiencyLabel::ALL.len(),
        );

        info!(
            accuracy = metrics.accuracy,
            precision = metrics.precision,
            recall = metrics.recall,
            f1 = metrics.f1,
            support = metrics.support,
            "Model evaluation completed"
        );

        let json = serde_json::to_vec_pretty(&metrics)
            .map_err(|e| Error::new(ErrorKind::Io, format!("Failed to encode metrics: {}", e)))?;
        std::fs::write(self.models.path(names::METRICS), json)?;

        Ok(metrics)
    }

    /// load -> train -> evaluate
    pub fn run(&self) -> Result<TrainingReport> {
        self.run_inner().map_err(|e| e.with_stage(Stage::ModelTrainer))
    }

    fn run_inner(&self) -> Result<TrainingReport> {
        let models = ArtifactStore::create(self.models.dir())?;
        let _lock = models.lock()?;

        let data = {
            // splits are read under the pipeline's lock; a missing
            // directory surfaces from load as ArtifactMissing
            let _processed_lock = if self.processed.dir().is_dir()
                && self.processed.dir() != self.models.dir()
            {
                Some(self.processed.lock()?)
            } else {
                None
            };
            self.load()?
        };
        let model = self.train(&data)?;
        let metrics = self.evaluate(&model, &data)?;

        Ok(TrainingReport {
            model_path: self.model_path(),
            train_rows: data.x_train.nrows(),
            test_rows: data.x_test.nrows(),
            iterations: model.n_iter(),
            converged: model.converged(),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_split(store: &ArtifactStore, skip: Option<&str>) {
        let x = Array2::from_shape_fn((30, NUM_FEATURES), |(i, j)| {
            let class = (i % 3) as f64;
            if j == 1 {
                class * 2.0 - 2.0 + (i as f64) * 0.01
            } else {
                0.0
            }
        });
        let y: Array1<usize> = (0..30).map(|i| i % 3).collect();
        for (name, is_x) in [
            (names::X_TRAIN, true),
            (names::X_TEST, true),
            (names::Y_TRAIN, false),
            (names::Y_TEST, false),
        ] {
            if Some(name) == skip {
                continue;
            }
            if is_x {
                store.save(name, &x).unwrap();
            } else {
                store.save(name, &y).unwrap();
            }
        }
    }

    #[test]
    fn test_run_persists_model_and_metrics() {
        let processed = tempdir().unwrap();
        let models = tempdir().unwrap();
        write_split(&ArtifactStore::new(processed.path()), None);

        let trainer = ModelTrainer::new(processed.path(), models.path());
        let report = trainer.run().unwrap();

        assert!(models.path().join(names::MODEL).exists());
        assert!(models.path().join(names::METRICS).exists());
        assert_eq!(report.train_rows, 30);
        assert!(report.metrics.accuracy > 0.9);

        let reloaded: LogisticRegression =
            ArtifactStore::new(models.path()).load(names::MODEL).unwrap();
        assert_eq!(reloaded.n_features(), NUM_FEATURES);
        assert_eq!(reloaded.n_classes(), 3);
    }

    #[test]
    fn test_run_refused_while_pipeline_holds_processed_dir() {
        let processed = tempdir().unwrap();
        let models = tempdir().unwrap();
        let store = ArtifactStore::new(processed.path());
        write_split(&store, None);

        let held = store.lock().unwrap();
        let err = ModelTrainer::new(processed.path(), models.path())
            .run()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConcurrentRun);
        assert!(!models.path().join(names::MODEL).exists());

        drop(held);
        assert!(ModelTrainer::new(processed.path(), models.path()).run().is_ok());
        assert!(!processed.path().join(crate::artifacts::LOCK_FILE).exists());
    }

    #[test]
    fn test_shared_directory_does_not_self_lock() {
        let dir = tempdir().unwrap();
        write_split(&ArtifactStore::new(dir.path()), None);
        assert!(ModelTrainer::new(dir.path(), dir.path()).run().is_ok());
    }

    #[test]
    fn test_missing_split_artifact() {
        let processed = tempdir().unwrap();
        let models = tempdir().unwrap();
        write_split(&ArtifactStore::new(processed.path()), Some(names::Y_TEST));

        let err = ModelTrainer::new(processed.path(), models.path())
            .run()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
        assert_eq!(err.stage(), Some(Stage::ModelTrainer));
        assert!(err.is_expected());
        assert!(!models.path().join(names::MODEL).exists());
    }
}
