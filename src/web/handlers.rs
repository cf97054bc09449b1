//! HTML page handlers

use crate::error::{ErrorKind, InferenceError};
use crate::web::form::PredictForm;
use crate::web::page::{render_form_page, render_unavailable, Outcome};
use crate::web::state::AppState;
use actix_web::error::{InternalError, UrlencodedError};
use actix_web::http::StatusCode;
use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};

fn html(status: StatusCode, body: String) -> HttpResponse {
    HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// Message shown in place of a verdict when a cycle is aborted
pub fn failure_message(error: &InferenceError) -> String {
    if error.is_client_error() {
        error.to_string()
    } else {
        format!("Error during prediction: {}", error)
    }
}

/// Status for an aborted cycle: 400 for bad values, 422 when the model failed
pub fn inference_status(error: &InferenceError) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

/// Page for a failure of the given kind.
///
/// Fatal failures replace the form for the rest of the run. Recoverable ones
/// are reported under the form, which keeps the submitted values.
fn failure_page(
    kind: ErrorKind,
    status: StatusCode,
    form: &PredictForm,
    message: String,
) -> HttpResponse {
    match kind {
        ErrorKind::StartupFatal => {
            html(StatusCode::SERVICE_UNAVAILABLE, render_unavailable(&message))
        }
        ErrorKind::Recoverable => {
            let outcome = Outcome::Error(message);
            html(status, render_form_page(form, Some(&outcome)))
        }
    }
}

#[get("/")]
pub async fn index(state: web::Data<AppState>) -> HttpResponse {
    match state.engine() {
        Ok(_) => html(StatusCode::OK, render_form_page(&PredictForm::default(), None)),
        Err(e) => failure_page(
            e.kind(),
            StatusCode::SERVICE_UNAVAILABLE,
            &PredictForm::default(),
            e.to_string(),
        ),
    }
}

#[post("/predict")]
pub async fn predict(state: web::Data<AppState>, form: web::Form<PredictForm>) -> HttpResponse {
    let form = form.into_inner();

    let engine = match state.engine() {
        Ok(engine) => engine,
        Err(e) => {
            return failure_page(e.kind(), StatusCode::SERVICE_UNAVAILABLE, &form, e.to_string());
        }
    };

    let record = match form.to_record() {
        Ok(record) => record,
        Err(e) => {
            state.metrics.record_rejected_input();
            return failure_page(e.kind(), inference_status(&e), &form, failure_message(&e));
        }
    };

    match state.score(engine, record).await {
        Ok(prediction) => html(
            StatusCode::OK,
            render_form_page(&form, Some(&Outcome::Verdict(prediction))),
        ),
        Err(e) => failure_page(e.kind(), inference_status(&e), &form, failure_message(&e)),
    }
}

/// Report an unreadable form body on the page instead of as plain text
pub fn form_error_handler(err: UrlencodedError, req: &HttpRequest) -> Error {
    let response = match req.app_data::<web::Data<AppState>>() {
        Some(state) => match state.engine() {
            Ok(_) => {
                state.metrics.record_rejected_input();
                rejected_form_page(&err)
            }
            Err(e) => failure_page(
                e.kind(),
                StatusCode::SERVICE_UNAVAILABLE,
                &PredictForm::default(),
                e.to_string(),
            ),
        },
        None => rejected_form_page(&err),
    };
    InternalError::from_response(err, response).into()
}

fn rejected_form_page(err: &UrlencodedError) -> HttpResponse {
    let e = InferenceError::InvalidInput(err.to_string());
    failure_page(
        e.kind(),
        inference_status(&e),
        &PredictForm::default(),
        failure_message(&e),
    )
}
