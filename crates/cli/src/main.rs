//! Machine efficiency CLI
//!
//! Runs the offline feature pipeline and model trainer, classifies single
//! rows against local artifacts, and checks a running server's health.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{batch, predict};
use efficiency_lib::StructuredLogger;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Machine efficiency classifier CLI
#[derive(Parser)]
#[command(name = "effctl")]
#[command(author, version, about = "CLI for the machine efficiency classifier", long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(long, short, global = true, default_value = "table")]
    pub format: output::OutputFormat,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the feature pipeline: raw CSV to scaled split artifacts
    Process {
        /// Raw telemetry CSV
        #[arg(long, env = "EFFICIENCY_INPUT", default_value = "artifacts/raw/data.csv")]
        input: PathBuf,

        /// Directory for the split and scaler artifacts
        #[arg(long, env = "EFFICIENCY_PROCESSED_DIR", default_value = "artifacts/processed")]
        processed_dir: PathBuf,
    },

    /// Train and evaluate the classifier on processed artifacts
    Train {
        /// Directory holding the split artifacts
        #[arg(long, env = "EFFICIENCY_PROCESSED_DIR", default_value = "artifacts/processed")]
        processed_dir: PathBuf,

        /// Directory for the model and metrics
        #[arg(long, env = "EFFICIENCY_MODEL_DIR", default_value = "artifacts/models")]
        model_dir: PathBuf,
    },

    /// Run the pipeline and then the trainer
    Run {
        /// Raw telemetry CSV
        #[arg(long, env = "EFFICIENCY_INPUT", default_value = "artifacts/raw/data.csv")]
        input: PathBuf,

        /// Directory for the split and scaler artifacts
        #[arg(long, env = "EFFICIENCY_PROCESSED_DIR", default_value = "artifacts/processed")]
        processed_dir: PathBuf,

        /// Directory for the model and metrics
        #[arg(long, env = "EFFICIENCY_MODEL_DIR", default_value = "artifacts/models")]
        model_dir: PathBuf,
    },

    /// Classify one row against local artifacts
    Predict {
        /// Feature transform artifact
        #[arg(long, env = "EFFICIENCY_SCALER_PATH", default_value = "artifacts/processed/scaler.bin")]
        scaler_path: PathBuf,

        /// Model artifact
        #[arg(long, env = "EFFICIENCY_MODEL_PATH", default_value = "artifacts/models/model.bin")]
        model_path: PathBuf,

        /// Feature value as NAME=VALUE, repeated for each of the 14 features
        #[arg(long = "field", value_parser = predict::parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Show the health of a running server
    Health {
        /// Server base URL
        #[arg(long, env = "EFFICIENCY_URL", default_value = "http://localhost:5002")]
        url: String,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

async fn execute(cli: Cli) -> Result<()> {
    let logger = StructuredLogger::new("effctl");

    match cli.command {
        Commands::Process {
            input,
            processed_dir,
        } => {
            batch::process(&logger, &input, &processed_dir, cli.format)?;
        }
        Commands::Train {
            processed_dir,
            model_dir,
        } => {
            batch::train(&logger, &processed_dir, &model_dir, cli.format)?;
        }
        Commands::Run {
            input,
            processed_dir,
            model_dir,
        } => {
            batch::run(&logger, &input, &processed_dir, &model_dir, cli.format)?;
        }
        Commands::Predict {
            scaler_path,
            model_path,
            fields,
        } => {
            predict::predict(&logger, &scaler_path, &model_path, fields, cli.format)?;
        }
        Commands::Health { url } => {
            predict::health(&url, cli.format).await?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // library errors were already reported by the command
            if e.downcast_ref::<efficiency_lib::Error>().is_none() {
                output::print_error(&format!("{:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}
