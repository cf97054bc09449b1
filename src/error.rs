//! Error types for model loading and inference
//!
//! Loading failures are fatal for the run; inference failures only abort the
//! current request. Both carry an [`ErrorKind`] so callers can decide between
//! halting and offering a retry.

use std::fmt;
use std::path::PathBuf;

/// How a failure affects the running service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No predictions are possible for the rest of the run
    StartupFatal,
    /// Only the current request is aborted
    Recoverable,
}

/// Errors raised while loading the model artifact
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact path does not resolve to a file
    NotFound { path: PathBuf },

    /// Artifact exists but the runtime refused it
    Incompatible { path: PathBuf, message: String },

    /// Inference runtime could not be initialized
    Runtime(String),
}

impl ModelError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::StartupFatal
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::NotFound { path } => {
                write!(f, "Model file not found at '{}'", path.display())
            }
            ModelError::Incompatible { message, .. } => write!(
                f,
                "Error loading the model: {}\n\
                 Check your ONNX Runtime version or re-export the pipeline.",
                message
            ),
            ModelError::Runtime(msg) => {
                write!(f, "Failed to initialize inference runtime: {}", msg)
            }
        }
    }
}

impl std::error::Error for ModelError {}

/// Errors raised during a single prediction cycle
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    /// Submitted values failed validation before reaching the model
    InvalidInput(String),

    /// Record does not line up with the model's inputs
    SchemaMismatch(String),

    /// Runtime failed while executing the model
    Runtime(String),

    /// Model returned something that is not a usable label or probability
    InvalidOutput(String),
}

impl InferenceError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Recoverable
    }

    /// True when the failure was caused by the submitted values
    pub fn is_client_error(&self) -> bool {
        matches!(self, InferenceError::InvalidInput(_))
    }
}

impl fmt::Display for InferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InferenceError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            InferenceError::SchemaMismatch(msg) => write!(f, "Schema mismatch: {}", msg),
            InferenceError::Runtime(msg) => write!(f, "Inference failed: {}", msg),
            InferenceError::InvalidOutput(msg) => write!(f, "Invalid model output: {}", msg),
        }
    }
}

impl std::error::Error for InferenceError {}

impl From<ort::Error> for InferenceError {
    fn from(e: ort::Error) -> Self {
        InferenceError::Runtime(e.to_string())
    }
}
