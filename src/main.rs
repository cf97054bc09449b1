//! Fraud Prediction App - Main Entry Point
//!
//! Loads the fraud pipeline once, then serves the prediction page and its
//! JSON API. A failed load is reported on every page for the rest of the run.

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use fraud_prediction_app::config::{AppConfig, LogFormat, LoggingConfig};
use fraud_prediction_app::models::inference::InferenceEngine;
use fraud_prediction_app::web::{configure, AppState};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "fraud_prediction_app={level},actix_web={level}",
            level = logging.level
        ))
    })?;

    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;
    init_logging(&config.logging)?;

    info!("Starting Fraud Prediction App");
    info!(
        model_path = %config.model.path,
        validate_schema = config.model.validate_schema,
        "Configuration loaded successfully"
    );

    // Load the model once; the result is fixed for the whole run
    let load_result = InferenceEngine::from_config(&config.model);
    match &load_result {
        Ok(engine) => info!(inputs = ?engine.model_info().inputs, "Inference engine ready"),
        Err(e) => error!(
            error = %e,
            "Model unavailable, predictions are disabled for this run"
        ),
    }

    let state = web::Data::new(AppState::from_load(load_result));
    let bind_address = config.bind_address();
    info!(address = %bind_address, workers = config.server.workers, "Listening");

    let server_state = state.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(server_state.clone())
            .configure(configure)
    })
    .workers(config.server.workers.max(1))
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run()
    .await
    .context("Server error")?;

    info!("Shutting down...");
    state.metrics.print_summary();

    Ok(())
}
