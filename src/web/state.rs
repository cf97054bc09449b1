//! Shared state handed to every request handler

use crate::error::{InferenceError, ModelError};
use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::Prediction;
use actix_web::web;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Outcome of the startup load step
pub enum ModelState {
    /// Model loaded, predictions available
    Ready(Arc<InferenceEngine>),
    /// Load failed; every page reports this error instead of a form
    Unavailable(ModelError),
}

pub struct AppState {
    pub model: ModelState,
    pub metrics: ServiceMetrics,
}

impl AppState {
    pub fn new(model: ModelState) -> Self {
        Self {
            model,
            metrics: ServiceMetrics::new(),
        }
    }

    /// Build state from the startup load result
    pub fn from_load(result: Result<InferenceEngine, ModelError>) -> Self {
        match result {
            Ok(engine) => Self::new(ModelState::Ready(Arc::new(engine))),
            Err(e) => Self::new(ModelState::Unavailable(e)),
        }
    }

    pub fn engine(&self) -> Result<Arc<InferenceEngine>, &ModelError> {
        match &self.model {
            ModelState::Ready(engine) => Ok(engine.clone()),
            ModelState::Unavailable(e) => Err(e),
        }
    }

    /// Run one prediction off the event loop and record its outcome
    pub async fn score(
        &self,
        engine: Arc<InferenceEngine>,
        record: TransactionRecord,
    ) -> Result<Prediction, InferenceError> {
        let start_time = Instant::now();
        let transaction_type = record.transaction_type;

        let result = match web::block(move || engine.predict(&record)).await {
            Ok(result) => result,
            Err(e) => Err(InferenceError::Runtime(format!("Blocking task failed: {}", e))),
        };

        match &result {
            Ok(prediction) => {
                let latency = start_time.elapsed();
                self.metrics.record_prediction(
                    latency,
                    prediction.fraud_probability,
                    prediction.verdict.is_fraud(),
                );
                info!(
                    prediction_id = %prediction.prediction_id,
                    transaction_type = %transaction_type,
                    label = prediction.label,
                    fraud_probability = prediction.fraud_probability,
                    latency_us = latency.as_micros() as u64,
                    "Prediction served"
                );
            }
            Err(e) if e.is_client_error() => {
                self.metrics.record_rejected_input();
                warn!(transaction_type = %transaction_type, error = %e, "Input rejected");
            }
            Err(e) => {
                self.metrics.record_inference_failure();
                error!(transaction_type = %transaction_type, error = %e, "Inference failed");
            }
        }

        result
    }
}
