//! Fraud classifier inference

use crate::config::ModelConfig;
use crate::error::{InferenceError, ModelError};
use crate::feature_extractor::{FeatureExtractor, FeatureRow, FeatureValue, FEATURE_SCHEMA};
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::types::transaction::TransactionRecord;
use crate::types::verdict::Prediction;
use ort::memory::Allocator;
use ort::session::Session;
use ort::tensor::TensorElementType;
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, DynValue, Tensor};
use serde::Serialize;
use std::sync::{Arc, MutexGuard};
use tracing::{debug, warn};

/// Tolerance for probabilities slightly outside [0, 1] due to float rounding
const PROBABILITY_EPSILON: f64 = 1e-6;

/// A fitted binary classifier over single-row feature tables
pub trait Classifier: Send + Sync {
    /// Predicted class label for the row
    fn predict(&self, row: &FeatureRow) -> Result<i64, InferenceError>;

    /// Probabilities for class 0 and class 1
    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError>;

    /// Description of the underlying artifact
    fn info(&self) -> ModelInfo;
}

/// Artifact description exposed over the API
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    /// Where the model came from
    pub source: String,
    /// Declared model inputs
    pub inputs: Vec<String>,
    /// Declared model outputs
    pub outputs: Vec<String>,
    /// Columns the app sends, in order
    pub feature_schema: Vec<String>,
}

impl ModelInfo {
    pub fn new(source: impl Into<String>, inputs: Vec<String>, outputs: Vec<String>) -> Self {
        Self {
            source: source.into(),
            inputs,
            outputs,
            feature_schema: FEATURE_SCHEMA.iter().map(|(n, _)| n.to_string()).collect(),
        }
    }
}

/// Scores transactions against a loaded classifier.
///
/// Built once at startup and shared read-only by every request handler.
pub struct InferenceEngine {
    classifier: Arc<dyn Classifier>,
    extractor: FeatureExtractor,
}

impl InferenceEngine {
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self {
            classifier,
            extractor: FeatureExtractor::new(),
        }
    }

    /// Load the configured artifact and wrap it in an engine
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let model = ModelLoader::new(config).load(&config.path)?;
        Ok(Self::new(Arc::new(model)))
    }

    pub fn model_info(&self) -> ModelInfo {
        self.classifier.info()
    }

    /// Score one transaction
    pub fn predict(&self, tx: &TransactionRecord) -> Result<Prediction, InferenceError> {
        tx.validate().map_err(InferenceError::InvalidInput)?;
        let row = self.extractor.extract(tx);
        self.predict_row(&row)
    }

    /// Score a prepared feature row.
    ///
    /// The row is passed to the model as-is; a row that does not match the
    /// model's inputs fails inside the classifier.
    pub fn predict_row(&self, row: &FeatureRow) -> Result<Prediction, InferenceError> {
        let label = self.classifier.predict(row)?;
        let probabilities = normalize_probabilities(self.classifier.predict_proba(row)?)?;

        let prediction = Prediction::new(label, probabilities);
        debug!(
            prediction_id = %prediction.prediction_id,
            label = label,
            fraud_probability = prediction.fraud_probability,
            "Inference complete"
        );
        Ok(prediction)
    }
}

/// Reject non-finite or out-of-range probabilities, clamping rounding noise
fn normalize_probabilities(probabilities: [f64; 2]) -> Result<[f64; 2], InferenceError> {
    let mut normalized = [0.0; 2];
    for (i, &p) in probabilities.iter().enumerate() {
        if !p.is_finite() || p < -PROBABILITY_EPSILON || p > 1.0 + PROBABILITY_EPSILON {
            return Err(InferenceError::InvalidOutput(format!(
                "class {} probability {} is outside [0, 1]",
                i, p
            )));
        }
        normalized[i] = p.clamp(0.0, 1.0);
    }
    Ok(normalized)
}

impl Classifier for LoadedModel {
    fn predict(&self, row: &FeatureRow) -> Result<i64, InferenceError> {
        let inputs = self.build_inputs(row)?;
        let mut session = self.lock_session()?;
        let outputs = session.run(inputs)?;

        let output = outputs.get(self.label_output.as_str()).ok_or_else(|| {
            InferenceError::InvalidOutput(format!("missing output '{}'", self.label_output))
        })?;
        let (_, data) = output.try_extract_tensor::<i64>().map_err(|e| {
            InferenceError::InvalidOutput(format!(
                "label output '{}' is not an int64 tensor: {}",
                self.label_output, e
            ))
        })?;

        data.first()
            .copied()
            .ok_or_else(|| InferenceError::InvalidOutput("empty label output".to_string()))
    }

    fn predict_proba(&self, row: &FeatureRow) -> Result<[f64; 2], InferenceError> {
        let inputs = self.build_inputs(row)?;
        let mut session = self.lock_session()?;
        let outputs = session.run(inputs)?;

        self.extract_probabilities(&outputs)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo::new(
            self.path.display().to_string(),
            self.input_names.clone(),
            self.output_names.clone(),
        )
    }
}

impl LoadedModel {
    fn lock_session(&self) -> Result<MutexGuard<'_, Session>, InferenceError> {
        self.session
            .lock()
            .map_err(|e| InferenceError::Runtime(format!("Lock error: {}", e)))
    }

    /// One `[1, 1]` tensor per column, typed after the model's declared input
    fn build_inputs(&self, row: &FeatureRow) -> Result<Vec<(String, DynValue)>, InferenceError> {
        let mut inputs = Vec::with_capacity(row.len());

        for (name, value) in row.columns() {
            let declared = self.input_types.get(name).copied();
            let shape = vec![1_i64, 1];

            let tensor = match (value, declared) {
                (FeatureValue::Categorical(s), None | Some(TensorElementType::String)) => {
                    Tensor::from_string_array((shape, std::slice::from_ref(s)))?.into_dyn()
                }
                (FeatureValue::Numeric(v), Some(TensorElementType::Float64)) => {
                    Tensor::from_array((shape, vec![*v]))?.into_dyn()
                }
                (FeatureValue::Numeric(v), None | Some(TensorElementType::Float32)) => {
                    Tensor::from_array((shape, vec![*v as f32]))?.into_dyn()
                }
                (_, Some(expected)) => {
                    return Err(InferenceError::SchemaMismatch(format!(
                        "column '{}' is {:?} but the model expects {:?}",
                        name,
                        value.kind(),
                        expected
                    )));
                }
            };

            inputs.push((name.clone(), tensor));
        }

        Ok(inputs)
    }

    /// Extract class probabilities from model output.
    /// Handles both tensor outputs and seq(map) outputs (ZipMap).
    fn extract_probabilities(
        &self,
        outputs: &ort::session::SessionOutputs,
    ) -> Result<[f64; 2], InferenceError> {
        let output = outputs.get(self.probability_output.as_str()).ok_or_else(|| {
            InferenceError::InvalidOutput(format!("missing output '{}'", self.probability_output))
        })?;

        if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
            let dims: Vec<i64> = shape.iter().copied().collect();
            let probabilities = probabilities_from_tensor(&dims, data)?;
            debug!(output = %self.probability_output, ?probabilities, "Extracted from tensor");
            return Ok(probabilities);
        }

        let dtype = output.dtype();
        if DynSequenceValueType::can_downcast(&dtype) {
            return extract_from_sequence_map(output);
        }

        warn!(output = %self.probability_output, dtype = ?dtype, "Unsupported probability output");
        Err(InferenceError::InvalidOutput(format!(
            "unsupported probability output type {:?}",
            dtype
        )))
    }
}

/// Class probabilities from a `[1, n]` or `[n]` float tensor
fn probabilities_from_tensor(dims: &[i64], data: &[f32]) -> Result<[f64; 2], InferenceError> {
    let num_classes = dims.last().copied().unwrap_or(0);

    match (num_classes, data) {
        (n, [p0, p1, ..]) if n >= 2 => Ok([*p0 as f64, *p1 as f64]),
        (1, [p, ..]) => Ok([1.0 - *p as f64, *p as f64]),
        _ => Err(InferenceError::InvalidOutput(format!(
            "unexpected probability tensor shape {:?}",
            dims
        ))),
    }
}

/// Extract probabilities from seq(map(int64, float)) format
fn extract_from_sequence_map(output: &DynValue) -> Result<[f64; 2], InferenceError> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| {
            InferenceError::InvalidOutput(format!("Failed to downcast to sequence: {}", e))
        })?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // Single-row input, so only the first map matters
    let map_value = maps
        .first()
        .ok_or_else(|| InferenceError::InvalidOutput("Empty sequence".to_string()))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;

    let class_probability = |class_id: i64| {
        kv_pairs
            .iter()
            .find(|(id, _)| *id == class_id)
            .map(|(_, p)| *p as f64)
    };

    match (class_probability(0), class_probability(1)) {
        (Some(p0), Some(p1)) => Ok([p0, p1]),
        (None, Some(p1)) => Ok([1.0 - p1, p1]),
        (Some(p0), None) => Ok([p0, 1.0 - p0]),
        (None, None) => Err(InferenceError::InvalidOutput(
            "No probability found in map".to_string(),
        )),
    }
}
