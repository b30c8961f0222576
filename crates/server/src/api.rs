//! HTTP API: the prediction form and the health check

use crate::page;
use efficiency_lib::{predictor::PredictionService, StructuredLogger};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Shared application state
pub struct AppState {
    pub service: Arc<PredictionService>,
    pub logger: StructuredLogger,
    pub inference_timeout: Duration,
}

impl AppState {
    pub fn new(
        service: PredictionService,
        logger: StructuredLogger,
        inference_timeout: Duration,
    ) -> Self {
        Self {
            service: Arc::new(service),
            logger,
            inference_timeout,
        }
    }
}

/// Empty form
async fn form(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Html(page::render(
        &HashMap::new(),
        None,
        state.service.operation_modes(),
    ))
}

/// Run one prediction and render its outcome next to the submitted form.
/// Failures become a message on the page; the status stays 200.
async fn predict(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    let result = run_prediction(&state, fields.clone()).await;
    Html(page::render(
        &fields,
        Some(&result),
        state.service.operation_modes(),
    ))
}

async fn run_prediction(state: &AppState, fields: HashMap<String, String>) -> String {
    let service = Arc::clone(&state.service);
    let started = Instant::now();
    let task = tokio::task::spawn_blocking(move || service.predict(&fields));

    match tokio::time::timeout(state.inference_timeout, task).await {
        Ok(Ok(Ok(prediction))) => {
            state
                .logger
                .log_prediction(&prediction, started.elapsed().as_micros() as u64);
            prediction.label.to_string()
        }
        Ok(Ok(Err(e))) => {
            state.logger.log_rejection(&e);
            format!("Error: {}", e)
        }
        Ok(Err(join_err)) => {
            error!(error = %join_err, "Prediction task failed");
            "Error: prediction failed".to_string()
        }
        Err(_) => {
            state
                .logger
                .log_timeout(state.inference_timeout.as_millis());
            "Error: prediction timed out".to_string()
        }
    }
}

/// Health check response - returns 200 if healthy, 503 otherwise
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.service.health();

    let status_code = if health.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health))
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(form).post(predict))
        .route("/health", get(health))
        .with_state(state)
}

/// Start the API server and run until `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
