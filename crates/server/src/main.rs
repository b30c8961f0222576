//! Efficiency server - serves machine efficiency predictions over HTTP
//!
//! Loads the feature transform and the fitted model once at startup. A
//! missing or damaged artifact leaves the server running in degraded mode,
//! reporting unhealthy and declining predictions.

use anyhow::Result;
use efficiency_lib::{predictor::PredictionService, StructuredLogger};
use efficiency_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting efficiency-server");

    let config = ServerConfig::load()?;
    info!(
        port = config.port,
        model_path = %config.model_path.display(),
        scaler_path = %config.scaler_path.display(),
        "Server configured"
    );

    let service = PredictionService::load(&config.scaler_path, &config.model_path);

    let logger = StructuredLogger::new("efficiency-server");
    logger.log_startup(SERVER_VERSION, &service.health());

    let app_state = Arc::new(api::AppState::new(
        service,
        logger.clone(),
        config.inference_timeout(),
    ));

    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    api::serve(config.port, app_state, shutdown).await?;

    logger.log_shutdown("SIGINT received");
    Ok(())
}
