//! Fraud Prediction App Library
//!
//! Interactive front-end for a pre-trained transaction fraud classifier:
//! collects one transaction, scores it against an ONNX export of the
//! fitted pipeline, and renders the verdict with its fraud probability.

pub mod config;
pub mod error;
pub mod feature_extractor;
pub mod metrics;
pub mod models;
pub mod types;
pub mod web;

pub use config::AppConfig;
pub use error::{ErrorKind, InferenceError, ModelError};
pub use feature_extractor::FeatureExtractor;
pub use models::inference::{Classifier, InferenceEngine};
pub use types::{transaction::TransactionRecord, verdict::Prediction};
