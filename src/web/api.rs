//! JSON API alongside the HTML page

use crate::error::ErrorKind;
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::Prediction;
use crate::web::handlers::{failure_message, inference_status};
use crate::web::state::AppState;
use actix_web::error::InternalError;
use actix_web::http::StatusCode;
use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};
use serde::Serialize;

/// Envelope for every API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub model_loaded: bool,
}

/// Prediction plus the percentage string shown on the page
#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    #[serde(flatten)]
    pub prediction: Prediction,
    pub probability_percent: String,
    pub message: String,
}

impl From<Prediction> for PredictionResponse {
    fn from(prediction: Prediction) -> Self {
        Self {
            probability_percent: prediction.probability_percent(),
            message: prediction.message(),
            prediction,
        }
    }
}

/// Error envelope for a failure of the given kind; fatal ones answer 503
fn failure(kind: ErrorKind, status: StatusCode, message: String) -> HttpResponse {
    let status = match kind {
        ErrorKind::StartupFatal => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Recoverable => status,
    };
    HttpResponse::build(status).json(ApiResponse::<()>::error(message))
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(HealthStatus {
        status: "ok",
        model_loaded: state.engine().is_ok(),
    }))
}

#[get("/model-info")]
pub async fn model_info(state: web::Data<AppState>) -> HttpResponse {
    match state.engine() {
        Ok(engine) => HttpResponse::Ok().json(ApiResponse::success(engine.model_info())),
        Err(e) => failure(e.kind(), StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    }
}

#[post("/predict")]
pub async fn predict(
    state: web::Data<AppState>,
    record: web::Json<TransactionRecord>,
) -> HttpResponse {
    let engine = match state.engine() {
        Ok(engine) => engine,
        Err(e) => return failure(e.kind(), StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    };

    match state.score(engine, record.into_inner()).await {
        Ok(prediction) => {
            HttpResponse::Ok().json(ApiResponse::success(PredictionResponse::from(prediction)))
        }
        Err(e) => failure(e.kind(), inference_status(&e), failure_message(&e)),
    }
}

#[get("/stats")]
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(state.metrics.snapshot()))
}

/// Reject malformed JSON bodies with the API envelope instead of plain text
pub fn json_error_handler(err: actix_web::error::JsonPayloadError, req: &HttpRequest) -> Error {
    if let Some(state) = req.app_data::<web::Data<AppState>>() {
        state.metrics.record_rejected_input();
    }
    let response = HttpResponse::build(StatusCode::BAD_REQUEST)
        .json(ApiResponse::<()>::error(format!("Invalid input: {}", err)));
    InternalError::from_response(err, response).into()
}
