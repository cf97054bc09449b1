//! End-to-end tests of the prediction page and API against stub classifiers

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use fraud_prediction_app::error::{InferenceError, ModelError};
use fraud_prediction_app::feature_extractor::{check_schema, FeatureRow, FeatureValue};
use fraud_prediction_app::models::inference::{Classifier, InferenceEngine, ModelInfo};
use fraud_prediction_app::web::{configure, AppState, ModelState};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// Scores TRANSFER and CASH_OUT that empty the origin account as fraud
struct AccountDrainClassifier;

impl AccountDrainClassifier {
    fn fraud_probability(row: &FeatureRow) -> Result<f64, InferenceError> {
        check_schema(row.names()).map_err(InferenceError::SchemaMismatch)?;

        let kind = match row.get("type") {
            Some(FeatureValue::Categorical(kind)) => kind.as_str(),
            _ => return Err(InferenceError::SchemaMismatch("type must be categorical".into())),
        };
        let numeric = |name: &str| match row.get(name) {
            Some(FeatureValue::Numeric(v)) => Ok(*v),
            _ => Err(InferenceError::SchemaMismatch(format!("{} must be numeric", name))),
        };

        let amount = numeric("amount")?;
        let old_balance = numeric("oldbalanceOrg")?;
        let new_balance = numeric("newbalanceOrig")?;

        let drained = old_balance > 0.0 && new_balance == 0.0 && amount >= old_balance;
        Ok(match (kind, drained) {
            ("TRANSFER" | "CASH_OUT", true) => 0.9731,
            ("TRANSFER" | "CASH_OUT", false) => 0.1234,
            _ => 0.0042,
        })
    }
}

impl Classifier for AccountDrainClassifier {
    fn predict(&self, row: &FeatureRow) -> Result<i64, InferenceError> {
        Ok(if Self::fraud_probability(row)? >= 0.5 { 1 } else { 0 })
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
        let p = Self::fraud_probability(row)?;
        Ok([1.0 - p, p])
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("account-drain", vec!["type".into(), "amount".into()], vec![])
    }
}

/// Model trained on a different schema: every call fails at inference time
struct RenamedColumnClassifier;

impl Classifier for RenamedColumnClassifier {
    fn predict(&self, row: &FeatureRow) -> Result<i64, InferenceError> {
        match row.get("transaction_amount") {
            Some(_) => Ok(0),
            None => Err(InferenceError::Runtime(
                "Missing input: transaction_amount".to_string(),
            )),
        }
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
        self.predict(row).map(|_| [1.0, 0.0])
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new("renamed", vec!["transaction_amount".into()], vec![])
    }
}

fn ready_state(classifier: impl Classifier + 'static) -> web::Data<AppState> {
    let engine = InferenceEngine::new(Arc::new(classifier));
    web::Data::new(AppState::new(ModelState::Ready(Arc::new(engine))))
}

fn missing_model_state() -> web::Data<AppState> {
    web::Data::new(AppState::from_load(Err(ModelError::NotFound {
        path: PathBuf::from("fraud_detection_pipeline.onnx"),
    })))
}

const TRANSFER_FORM: &str = "type=TRANSFER&amount=1000.0&oldbalanceOrg=5000.0\
                             &newbalanceOrig=4000.0&oldbalanceDest=0.0&newbalanceDest=0.0";

fn body_text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Count `NN.NN%` style percentages following "Probability: "
fn probability_strings(html: &str) -> Vec<String> {
    html.match_indices("Probability: ")
        .map(|(i, marker)| {
            html[i + marker.len()..]
                .chars()
                .take_while(|c| *c != '<')
                .collect()
        })
        .collect()
}

fn is_percentage(s: &str) -> bool {
    let Some(number) = s.strip_suffix('%') else {
        return false;
    };
    let Some((whole, fraction)) = number.split_once('.') else {
        return false;
    };
    !whole.is_empty()
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.len() == 2
        && fraction.chars().all(|c| c.is_ascii_digit())
        && number.parse::<f64>().map(|v| (0.0..=100.0).contains(&v)).unwrap_or(false)
}

#[actix_web::test]
async fn index_renders_form_with_defaults() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("Fraud Detection Prediction App"));
    assert!(html.contains("Predict Fraud"));
    assert!(html.contains("value=\"1000.00\""));
    assert!(probability_strings(&html).is_empty());
}

#[actix_web::test]
async fn transfer_scenario_renders_exactly_one_verdict() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(TRANSFER_FORM)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(&test::read_body(resp).await);
    let verdicts =
        html.matches("FRAUD DETECTED").count() + html.matches("Transaction is NOT Fraud").count();
    assert_eq!(verdicts, 1);

    let probabilities = probability_strings(&html);
    assert_eq!(probabilities.len(), 1);
    assert!(is_percentage(&probabilities[0]), "{}", probabilities[0]);
    assert_eq!(probabilities[0], "12.34%");
    assert!(html.contains("alert success"));
}

#[actix_web::test]
async fn drained_cash_out_is_flagged() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_form([
            ("type", "CASH_OUT"),
            ("amount", "7500"),
            ("oldbalanceOrg", "7500"),
            ("newbalanceOrig", "0"),
            ("oldbalanceDest", "0"),
            ("newbalanceDest", "7500"),
        ])
        .to_request();
    let html = body_text(&test::read_body(test::call_service(&app, req).await).await);

    assert!(html.contains("FRAUD DETECTED\nProbability: 97.31%"));
    assert!(html.contains("alert error"));
    assert!(!html.contains("NOT Fraud"));
}

#[actix_web::test]
async fn zero_valued_fields_are_accepted() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_form([
            ("type", "PAYMENT"),
            ("amount", "0.0"),
            ("oldbalanceOrg", "0.0"),
            ("newbalanceOrig", "0.0"),
            ("oldbalanceDest", "0.0"),
            ("newbalanceDest", "0.0"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("Transaction is NOT Fraud\nProbability: 0.42%"));
}

#[actix_web::test]
async fn negative_amount_is_rejected_without_verdict() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/predict")
        .set_form([
            ("type", "TRANSFER"),
            ("amount", "-10"),
            ("oldbalanceOrg", "5000"),
            ("newbalanceOrig", "4000"),
            ("oldbalanceDest", "0"),
            ("newbalanceDest", "0"),
        ])
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("amount must be &gt;= 0"));
    assert!(probability_strings(&html).is_empty());
    // submitted values are kept for the retry
    assert!(html.contains("value=\"-10\""));
    assert!(html.contains("Predict Fraud"));
}

#[actix_web::test]
async fn unreadable_form_body_renders_page_with_error() {
    let state = ready_state(AccountDrainClassifier);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    // Wrong content type
    let req = test::TestRequest::post()
        .uri("/predict")
        .set_json(json!({ "type": "TRANSFER", "amount": 1000.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("Invalid input:"));
    assert!(html.contains("alert error"));
    assert!(html.contains("Predict Fraud"));
    assert!(probability_strings(&html).is_empty());

    // Repeated field
    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload("type=TRANSFER&type=PAYMENT&amount=1000.0")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("Invalid input:"));
    assert!(html.contains("<form"));

    assert_eq!(state.metrics.snapshot().rejected_inputs, 2);

    // The next well-formed submission is scored normally
    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(TRANSFER_FORM)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn schema_mismatch_reports_error_and_form_stays_usable() {
    let state = ready_state(RenamedColumnClassifier);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/predict")
            .insert_header(("content-type", "application/x-www-form-urlencoded"))
            .set_payload(TRANSFER_FORM)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let html = body_text(&test::read_body(resp).await);
        assert!(html.contains("Error during prediction: Inference failed"));
        assert!(html.contains("Missing input: transaction_amount"));
        assert!(!html.contains("FRAUD DETECTED"));
        assert!(!html.contains("NOT Fraud"));
        assert!(html.contains("Predict Fraud"));
    }

    let stats = state.metrics.snapshot();
    assert_eq!(stats.inference_failures, 2);
    assert_eq!(stats.predictions_served, 0);
}

#[actix_web::test]
async fn missing_model_disables_predictions() {
    let app = test::init_service(
        App::new()
            .app_data(missing_model_state())
            .configure(configure),
    )
    .await;

    let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_text(&test::read_body(resp).await);
    assert!(html.contains("Model file not found at &#39;fraud_detection_pipeline.onnx&#39;"));
    assert!(!html.contains("<form"));

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(TRANSFER_FORM)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    let html = body_text(&test::read_body(resp).await);
    assert!(probability_strings(&html).is_empty());

    let req = test::TestRequest::post()
        .uri("/api/predict")
        .set_json(json!({
            "type": "TRANSFER",
            "amount": 1000.0,
            "oldbalanceOrg": 5000.0,
            "newbalanceOrig": 4000.0,
            "oldbalanceDest": 0.0,
            "newbalanceDest": 0.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let health: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/health").to_request(),
    )
    .await;
    assert_eq!(health["data"]["model_loaded"], false);
}

#[actix_web::test]
async fn api_predict_is_idempotent() {
    let app = test::init_service(
        App::new()
            .app_data(ready_state(AccountDrainClassifier))
            .configure(configure),
    )
    .await;

    let payload = json!({
        "type": "TRANSFER",
        "amount": 1000.0,
        "oldbalanceOrg": 5000.0,
        "newbalanceOrig": 4000.0,
        "oldbalanceDest": 0.0,
        "newbalanceDest": 0.0
    });

    let mut responses = Vec::new();
    for _ in 0..2 {
        let req = test::TestRequest::post()
            .uri("/api/predict")
            .set_json(&payload)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        responses.push(body);
    }

    for body in &responses {
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["verdict"], "not_fraud");
        assert_eq!(body["data"]["probability_percent"], "12.34%");
    }
    assert_eq!(responses[0]["data"]["label"], responses[1]["data"]["label"]);
    assert_eq!(
        responses[0]["data"]["fraud_probability"],
        responses[1]["data"]["fraud_probability"]
    );
    assert_ne!(
        responses[0]["data"]["prediction_id"],
        responses[1]["data"]["prediction_id"]
    );
}

#[actix_web::test]
async fn api_rejects_unknown_transaction_type() {
    let state = ready_state(AccountDrainClassifier);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let req = test::TestRequest::post()
        .uri("/api/predict")
        .set_json(json!({
            "type": "DEBIT",
            "amount": 1.0,
            "oldbalanceOrg": 1.0,
            "newbalanceOrig": 0.0,
            "oldbalanceDest": 0.0,
            "newbalanceDest": 1.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid input"));
    assert_eq!(state.metrics.snapshot().rejected_inputs, 1);
}

#[actix_web::test]
async fn api_model_info_and_stats() {
    let state = ready_state(AccountDrainClassifier);
    let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

    let info: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/model-info").to_request(),
    )
    .await;
    assert_eq!(info["data"]["source"], "account-drain");
    assert_eq!(
        info["data"]["feature_schema"],
        json!([
            "type",
            "amount",
            "oldbalanceOrg",
            "newbalanceOrig",
            "oldbalanceDest",
            "newbalanceDest"
        ])
    );

    let req = test::TestRequest::post()
        .uri("/predict")
        .insert_header(("content-type", "application/x-www-form-urlencoded"))
        .set_payload(TRANSFER_FORM)
        .to_request();
    test::call_service(&app, req).await;

    let stats: Value = test::call_and_read_body_json(
        &app,
        test::TestRequest::get().uri("/api/stats").to_request(),
    )
    .await;
    assert_eq!(stats["data"]["predictions_served"], 1);
    assert_eq!(stats["data"]["fraud_verdicts"], 0);
    assert_eq!(stats["data"]["probability_distribution"][1], 1);
}
