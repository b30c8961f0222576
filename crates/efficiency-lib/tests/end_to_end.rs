//! Integration tests across the pipeline, trainer and prediction service

use efficiency_lib::artifacts::{names, ArtifactStore};
use efficiency_lib::pipeline::{FeaturePipeline, FeatureTransform};
use efficiency_lib::predictor::{PredictionService, ServiceState, ServiceStatus};
use efficiency_lib::trainer::ModelTrainer;
use efficiency_lib::{ErrorKind, Stage, FEATURE_NAMES, NUM_FEATURES};
use ndarray::{Array1, Array2};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "Timestamp,Machine_ID,Operation_Mode,Temperature_C,Vibration_Hz,Power_Consumption_kW,Network_Latency_ms,Packet_Loss_%,Quality_Control_Defect_Rate_%,Production_Speed_units_per_hr,Predictive_Maintenance_Score,Error_Rate_%,Efficiency_Status";

const MODES: [&str; 4] = ["Active", "Auto", "Idle", "Maintenance"];

/// Synthetic corpus where the label follows error rate and production speed
fn synthetic_csv(rows: usize) -> String {
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 0..rows {
        let class = i % 3;
        let jitter = ((i * 7) % 10) as f64 * 0.1;
        let error_rate = [14.0, 8.0, 2.0][class] + jitter;
        let speed = [150.0, 300.0, 450.0][class] + jitter * 10.0;
        let status = ["Low", "Medium", "High"][class];
        let _ = writeln!(
            csv,
            "2024-01-{:02} {:02}:{:02}:00,{},{},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{:.2},{}",
            1 + i / 1440,
            (i / 60) % 24,
            i % 60,
            i % 50,
            MODES[(i / 3) % MODES.len()],
            60.0 + ((i * 13) % 30) as f64,
            1.0 + ((i * 3) % 5) as f64,
            5.0 + ((i * 11) % 7) as f64,
            10.0 + ((i * 17) % 20) as f64,
            ((i * 5) % 4) as f64 * 0.5,
            1.0 + jitter,
            speed,
            ((i * 19) % 10) as f64 * 0.1,
            error_rate,
            status,
        );
    }
    csv
}

struct Workspace {
    _dir: TempDir,
    raw: PathBuf,
    processed: PathBuf,
    models: PathBuf,
}

fn workspace(rows: usize) -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let raw = dir.path().join("raw").join("data.csv");
    std::fs::create_dir_all(raw.parent().unwrap()).unwrap();
    std::fs::write(&raw, synthetic_csv(rows)).unwrap();
    Workspace {
        processed: dir.path().join("processed"),
        models: dir.path().join("models"),
        raw,
        _dir: dir,
    }
}

fn load_split(dir: &Path) -> (Array2<f64>, Array2<f64>, Array1<usize>, Array1<usize>) {
    let store = ArtifactStore::new(dir);
    (
        store.load(names::X_TRAIN).unwrap(),
        store.load(names::X_TEST).unwrap(),
        store.load(names::Y_TRAIN).unwrap(),
        store.load(names::Y_TEST).unwrap(),
    )
}

fn request() -> HashMap<String, String> {
    let values = [
        "Auto", "75.0", "3.2", "8.5", "14.0", "0.5", "1.5", "455.0", "0.4", "2.3", "2024", "1",
        "1", "3",
    ];
    FEATURE_NAMES
        .iter()
        .zip(values)
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_pipeline_is_reproducible() {
    let ws = workspace(300);
    let pipeline = FeaturePipeline::new(&ws.raw, &ws.processed);

    pipeline.run().unwrap();
    let first_scaler: FeatureTransform =
        ArtifactStore::new(&ws.processed).load(names::SCALER).unwrap();
    let first_split = load_split(&ws.processed);

    pipeline.run().unwrap();
    let second_scaler: FeatureTransform =
        ArtifactStore::new(&ws.processed).load(names::SCALER).unwrap();
    let second_split = load_split(&ws.processed);

    assert_eq!(first_scaler, second_scaler);
    assert_eq!(first_split, second_split);
}

#[test]
fn test_scaling_uses_train_statistics_only() {
    let ws = workspace(300);
    let pipeline = FeaturePipeline::new(&ws.raw, &ws.processed);

    let records = pipeline.load().unwrap();
    let dataset = pipeline.preprocess(&records).unwrap();
    let raw_split = pipeline.split(&dataset);

    let report = pipeline.run().unwrap();
    assert_eq!(report.train_rows, raw_split.train_features.len());

    let transform: FeatureTransform =
        ArtifactStore::new(&ws.processed).load(names::SCALER).unwrap();
    let (x_train, x_test, _, _) = load_split(&ws.processed);

    let n = raw_split.train_features.len() as f64;
    for j in 0..NUM_FEATURES {
        let mean: f64 = raw_split
            .train_features
            .iter()
            .map(|r| r.values()[j])
            .sum::<f64>()
            / n;
        assert!((transform.scaler.mean[j] - mean).abs() < 1e-9);
    }

    for (i, raw) in raw_split.test_features.iter().enumerate() {
        for j in 0..NUM_FEATURES {
            let expected = (raw.values()[j] - transform.scaler.mean[j]) / transform.scaler.std[j];
            assert!((x_test[[i, j]] - expected).abs() < 1e-9);
        }
    }
    for (i, raw) in raw_split.train_features.iter().enumerate() {
        let expected = (raw.values()[1] - transform.scaler.mean[1]) / transform.scaler.std[1];
        assert!((x_train[[i, 1]] - expected).abs() < 1e-9);
    }
}

#[test]
fn test_split_preserves_class_proportions() {
    let ws = workspace(301);
    let report = FeaturePipeline::new(&ws.raw, &ws.processed).run().unwrap();
    let (_, _, y_train, y_test) = load_split(&ws.processed);

    let total = (y_train.len() + y_test.len()) as f64;
    for class in 0..3 {
        let whole = report.class_counts[class] as f64 / total;
        let train = y_train.iter().filter(|c| **c == class).count() as f64 / y_train.len() as f64;
        let test = y_test.iter().filter(|c| **c == class).count() as f64 / y_test.len() as f64;
        assert!((train - whole).abs() < 0.02, "train share {} vs {}", train, whole);
        assert!((test - whole).abs() < 0.02, "test share {} vs {}", test, whole);
    }
}

#[test]
fn test_end_to_end_prediction() {
    let ws = workspace(300);
    FeaturePipeline::new(&ws.raw, &ws.processed).run().unwrap();
    let report = ModelTrainer::new(&ws.processed, &ws.models).run().unwrap();
    assert!(report.metrics.accuracy > 0.8);

    let service = PredictionService::load(
        &ws.processed.join(names::SCALER),
        &ws.models.join(names::MODEL),
    );
    assert_eq!(service.state(), ServiceState::Ready);
    assert_eq!(service.health().status, ServiceStatus::Healthy);
    let modes: Vec<&str> = service.operation_modes().iter().map(String::as_str).collect();
    assert_eq!(modes, MODES);

    let prediction = service.predict(&request()).unwrap();
    assert!(["Low", "Medium", "High"].contains(&prediction.label));
    // low error rate and high speed sit in the High cluster
    assert_eq!(prediction.label, "High");

    for _ in 0..5 {
        assert_eq!(service.predict(&request()).unwrap(), prediction);
    }
}

#[test]
fn test_missing_model_degrades_service() {
    let ws = workspace(120);
    FeaturePipeline::new(&ws.raw, &ws.processed).run().unwrap();

    let service = PredictionService::load(
        &ws.processed.join(names::SCALER),
        &ws.models.join(names::MODEL),
    );
    let health = service.health();
    assert!(!health.model_loaded);
    assert!(health.scaler_loaded);
    assert_eq!(health.status, ServiceStatus::Unhealthy);

    let err = service.predict(&request()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ServiceUnavailable);
}

#[test]
fn test_trainer_without_pipeline_output() {
    let ws = workspace(10);
    let err = ModelTrainer::new(&ws.processed, &ws.models)
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArtifactMissing);
    assert_eq!(err.stage(), Some(Stage::ModelTrainer));
}

#[test]
fn test_unknown_label_aborts_pipeline() {
    let ws = workspace(30);
    let mut csv = std::fs::read_to_string(&ws.raw).unwrap();
    csv.push_str("2024-01-02 00:00:00,1,Auto,70,3,8,12,0.5,1.0,300,0.5,5.0,Extreme\n");
    std::fs::write(&ws.raw, csv).unwrap();

    let err = FeaturePipeline::new(&ws.raw, &ws.processed)
        .run()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownLabel);
    assert_eq!(err.stage(), Some(Stage::FeaturePipeline));
    assert!(!ws.processed.join(names::SCALER).exists());
}
