//! Offline batch commands: process, train, run

use anyhow::Result;
use efficiency_lib::pipeline::{FeaturePipeline, PipelineReport};
use efficiency_lib::trainer::{ModelTrainer, TrainingReport};
use efficiency_lib::{Error, StructuredLogger};
use serde::Serialize;
use std::path::Path;

use crate::output::{format_percent, print_error, print_report, print_status, FieldRow, OutputFormat};

/// Log a failed stage and turn it into the CLI's error
fn stage_failed(logger: &StructuredLogger, err: Error) -> anyhow::Error {
    logger.log_stage_failure(&err);
    print_error(&err.to_string());
    anyhow::Error::new(err)
}

fn run_pipeline(
    logger: &StructuredLogger,
    input: &Path,
    processed: &Path,
) -> Result<PipelineReport> {
    let report = FeaturePipeline::new(input, processed)
        .run()
        .map_err(|e| stage_failed(logger, e))?;
    logger.log_pipeline_completed(&report);
    Ok(report)
}

fn run_trainer(
    logger: &StructuredLogger,
    processed: &Path,
    models: &Path,
) -> Result<TrainingReport> {
    let report = ModelTrainer::new(processed, models)
        .run()
        .map_err(|e| stage_failed(logger, e))?;
    logger.log_training_completed(&report);
    Ok(report)
}

/// Both reports of a full run, printed as one JSON document
#[derive(Serialize)]
struct RunReport<'a> {
    pipeline: &'a PipelineReport,
    training: &'a TrainingReport,
}

/// Run the feature pipeline only
pub fn process(
    logger: &StructuredLogger,
    input: &Path,
    processed: &Path,
    format: OutputFormat,
) -> Result<PipelineReport> {
    let report = run_pipeline(logger, input, processed)?;
    print_report(&report, pipeline_rows(&report), format);
    print_status(&format!("Artifacts written to {}", processed.display()), format);
    Ok(report)
}

/// Run the model trainer only
pub fn train(
    logger: &StructuredLogger,
    processed: &Path,
    models: &Path,
    format: OutputFormat,
) -> Result<TrainingReport> {
    let report = run_trainer(logger, processed, models)?;
    print_report(&report, training_rows(&report), format);
    print_status(&format!("Model written to {}", report.model_path.display()), format);
    Ok(report)
}

/// Pipeline then trainer; the trainer does not start if the pipeline failed
pub fn run(
    logger: &StructuredLogger,
    input: &Path,
    processed: &Path,
    models: &Path,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            process(logger, input, processed, format)?;
            train(logger, processed, models, format)?;
        }
        OutputFormat::Json => {
            let pipeline = run_pipeline(logger, input, processed)?;
            let training = run_trainer(logger, processed, models)?;
            let report = RunReport {
                pipeline: &pipeline,
                training: &training,
            };
            print_report(&report, Vec::new(), format);
        }
    }
    Ok(())
}

fn pipeline_rows(report: &PipelineReport) -> Vec<FieldRow> {
    vec![
        FieldRow::new("Rows loaded", report.rows_loaded),
        FieldRow::new("Rows dropped", report.rows_dropped),
        FieldRow::new("Train rows", report.train_rows),
        FieldRow::new("Test rows", report.test_rows),
        FieldRow::new("Low", report.class_counts[0]),
        FieldRow::new("Medium", report.class_counts[1]),
        FieldRow::new("High", report.class_counts[2]),
        FieldRow::new("Operation modes", report.operation_modes.join(", ")),
    ]
}

fn training_rows(report: &TrainingReport) -> Vec<FieldRow> {
    let m = &report.metrics;
    vec![
        FieldRow::new("Train rows", report.train_rows),
        FieldRow::new("Test rows", report.test_rows),
        FieldRow::new("Iterations", report.iterations),
        FieldRow::new("Converged", report.converged),
        FieldRow::new("Accuracy", format_percent(m.accuracy)),
        FieldRow::new("Precision (weighted)", format_percent(m.precision)),
        FieldRow::new("Recall (weighted)", format_percent(m.recall)),
        FieldRow::new("F1 (weighted)", format_percent(m.f1)),
    ]
}
