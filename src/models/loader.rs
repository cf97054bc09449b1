//! ONNX model loader

use crate::config::ModelConfig;
use crate::error::ModelError;
use crate::feature_extractor::check_schema;
use anyhow::Result;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::tensor::TensorElementType;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Loaded fraud pipeline with its declared signature
pub struct LoadedModel {
    /// Artifact path the model was read from
    pub path: PathBuf,
    /// ONNX Runtime session; runs need exclusive access
    pub(crate) session: Mutex<Session>,
    /// Declared inputs in model order
    pub input_names: Vec<String>,
    /// Declared element type per input, when the input is a tensor
    pub(crate) input_types: HashMap<String, TensorElementType>,
    /// Output carrying the predicted label
    pub label_output: String,
    /// Output carrying class probabilities
    pub probability_output: String,
    /// All declared outputs
    pub output_names: Vec<String>,
}

/// Loader for the fraud pipeline artifact
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Reject artifacts whose inputs differ from the feature schema
    validate_schema: bool,
}

impl ModelLoader {
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            onnx_threads: config.onnx_threads.max(1),
            validate_schema: config.validate_schema,
        }
    }

    /// Load the artifact at `path`.
    ///
    /// A path that is not a file fails with [`ModelError::NotFound`] before
    /// the runtime is touched.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedModel, ModelError> {
        let path = path.as_ref();

        if !path.is_file() {
            warn!(path = %path.display(), "Model file not found");
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }

        init_runtime().map_err(|e| ModelError::Runtime(e.to_string()))?;

        info!(path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = self
            .build_session(path)
            .map_err(|e| ModelError::Incompatible {
                path: path.to_path_buf(),
                message: format!("{:#}", e),
            })?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
        let input_types: HashMap<String, TensorElementType> = session
            .inputs
            .iter()
            .filter_map(|i| i.input_type.tensor_type().map(|t| (i.name.clone(), t)))
            .collect();
        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        let label_output = output_names
            .iter()
            .find(|name| name.contains("label"))
            .cloned()
            .ok_or_else(|| ModelError::Incompatible {
                path: path.to_path_buf(),
                message: format!("model declares no label output (outputs: {:?})", output_names),
            })?;

        let probability_output = output_names
            .iter()
            .find(|name| name.contains("prob"))
            .or_else(|| output_names.iter().find(|name| **name != label_output))
            .cloned()
            .ok_or_else(|| ModelError::Incompatible {
                path: path.to_path_buf(),
                message: format!(
                    "model declares no probability output (outputs: {:?})",
                    output_names
                ),
            })?;

        if self.validate_schema {
            check_schema(input_names.iter().map(String::as_str)).map_err(|message| {
                ModelError::Incompatible {
                    path: path.to_path_buf(),
                    message: format!("model inputs do not match the feature schema: {}", message),
                }
            })?;
        }

        info!(
            inputs = ?input_names,
            label = %label_output,
            probabilities = %probability_output,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            path: path.to_path_buf(),
            session: Mutex::new(session),
            input_names,
            input_types,
            label_output,
            probability_output,
            output_names,
        })
    }

    fn build_session(&self, path: &Path) -> Result<Session> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)?;
        Ok(session)
    }
}

fn init_runtime() -> Result<()> {
    ort::init().commit()?;
    Ok(())
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new(&ModelConfig::default())
    }
}
