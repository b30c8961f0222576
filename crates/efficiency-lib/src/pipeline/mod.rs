//! Feature pipeline
//!
//! Turns raw telemetry into scaled train/test matrices plus the frozen
//! transform that inference must reproduce. Runs to completion on one
//! thread; concurrent runs on one directory are refused by the run lock.

mod encoding;
mod loader;
mod preprocess;
mod scaler;
mod split;
mod transform;

pub use encoding::EncodingTables;
pub use loader::{load_records, read_records};
pub use preprocess::{parse_timestamp, preprocess, ProcessedDataset, TimeFeatures};
pub use scaler::ScalerParams;
pub use split::{stratified_split, SplitIndices, SPLIT_SEED, TEST_SIZE};
pub use transform::FeatureTransform;

use crate::artifacts::{names, ArtifactStore};
use crate::error::{Result, Stage};
use crate::models::{EfficiencyLabel, FeatureVector, RawRecord, NUM_FEATURES};
use ndarray::{Array1, Array2};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Train and test rows before or after scaling
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    pub train_features: Vec<FeatureVector>,
    pub train_labels: Vec<EfficiencyLabel>,
    pub test_features: Vec<FeatureVector>,
    pub test_labels: Vec<EfficiencyLabel>,
}

/// Summary of a completed pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    /// Rows per label, indexed by label code
    pub class_counts: [usize; 3],
    pub operation_modes: Vec<String>,
}

/// Stack feature rows into an `n x NUM_FEATURES` matrix
pub fn to_matrix(rows: &[FeatureVector]) -> Array2<f64> {
    Array2::from_shape_fn((rows.len(), NUM_FEATURES), |(i, j)| rows[i].values()[j])
}

/// Label codes as a vector
pub fn to_label_codes(labels: &[EfficiencyLabel]) -> Array1<usize> {
    labels.iter().map(|l| l.code()).collect()
}

/// Offline feature pipeline over one raw input and one output directory
pub struct FeaturePipeline {
    input_path: PathBuf,
    store: ArtifactStore,
    test_size: f64,
    seed: u64,
}

impl FeaturePipeline {
    pub fn new(input_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            store: ArtifactStore::new(output_dir),
            test_size: TEST_SIZE,
            seed: SPLIT_SEED,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_dir(&self) -> &Path {
        self.store.dir()
    }

    pub fn load(&self) -> Result<Vec<RawRecord>> {
        load_records(&self.input_path)
    }

    pub fn preprocess(&self, records: &[RawRecord]) -> Result<ProcessedDataset> {
        preprocess(records)
    }

    pub fn split(&self, dataset: &ProcessedDataset) -> DatasetSplit {
        let indices = stratified_split(&dataset.labels, self.test_size, self.seed);
        let pick = |idx: &[usize]| -> (Vec<FeatureVector>, Vec<EfficiencyLabel>) {
            idx.iter()
                .map(|&i| (dataset.features[i], dataset.labels[i]))
                .unzip()
        };
        let (train_features, train_labels) = pick(&indices.train);
        let (test_features, test_labels) = pick(&indices.test);

        info!(
            train_rows = train_labels.len(),
            test_rows = test_labels.len(),
            seed = self.seed,
            "Stratified split completed"
        );

        DatasetSplit {
            train_features,
            train_labels,
            test_features,
            test_labels,
        }
    }

    /// Fit the scaler on the train rows and apply it to both splits
    pub fn scale(&self, split: DatasetSplit) -> Result<(ScalerParams, DatasetSplit)> {
        let scaler = ScalerParams::fit(&split.train_features)?;
        let scaled = DatasetSplit {
            train_features: scaler.transform_all(&split.train_features),
            test_features: scaler.transform_all(&split.test_features),
            ..split
        };
        Ok((scaler, scaled))
    }

    /// Write the five artifacts one after another.
    ///
    /// A failure partway leaves earlier files in place; the next run
    /// replaces all of them.
    pub fn persist(&self, split: &DatasetSplit, transform: &FeatureTransform) -> Result<()> {
        self.store
            .save(names::X_TRAIN, &to_matrix(&split.train_features))?;
        self.store.save(names::X_TEST, &to_matrix(&split.test_features))?;
        self.store
            .save(names::Y_TRAIN, &to_label_codes(&split.train_labels))?;
        self.store
            .save(names::Y_TEST, &to_label_codes(&split.test_labels))?;
        self.store.save(names::SCALER, transform)?;

        info!(dir = %self.store.dir().display(), "Pipeline artifacts written");
        Ok(())
    }

    /// load -> preprocess -> split -> scale -> persist
    pub fn run(&self) -> Result<PipelineReport> {
        self.run_inner()
            .map_err(|e| e.with_stage(Stage::FeaturePipeline))
    }

    fn run_inner(&self) -> Result<PipelineReport> {
        let store = ArtifactStore::create(self.store.dir())?;
        let _lock = store.lock()?;

        let records = self.load()?;
        let dataset = self.preprocess(&records)?;
        let split = self.split(&dataset);
        let (scaler, scaled) = self.scale(split)?;
        let transform = FeatureTransform::new(dataset.encoding.clone(), scaler);
        self.persist(&scaled, &transform)?;

        Ok(PipelineReport {
            rows_loaded: records.len(),
            rows_dropped: dataset.dropped_rows,
            train_rows: scaled.train_labels.len(),
            test_rows: scaled.test_labels.len(),
            class_counts: dataset.class_counts(),
            operation_modes: dataset.encoding.operation_modes().to_vec(),
        })
    }
}
