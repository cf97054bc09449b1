//! Prediction outcome returned to the user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label value of the fraud class
pub const POSITIVE_LABEL: i64 = 1;

/// Binary verdict derived from the predicted label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Fraud,
    NotFraud,
}

impl Verdict {
    pub fn from_label(label: i64) -> Self {
        if label == POSITIVE_LABEL {
            Verdict::Fraud
        } else {
            Verdict::NotFraud
        }
    }

    /// Headline shown to the user
    pub fn headline(&self) -> &'static str {
        match self {
            Verdict::Fraud => "FRAUD DETECTED",
            Verdict::NotFraud => "Transaction is NOT Fraud",
        }
    }

    pub fn is_fraud(&self) -> bool {
        matches!(self, Verdict::Fraud)
    }
}

/// Format a probability in [0, 1] as a percentage with two decimals
pub fn format_probability(probability: f64) -> String {
    format!("{:.2}%", probability * 100.0)
}

/// Result of scoring one transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Unique identifier for log correlation
    pub prediction_id: String,

    /// Raw label from the model
    pub label: i64,

    /// Verdict derived from the label
    pub verdict: Verdict,

    /// Probability of the positive (fraud) class
    pub fraud_probability: f64,

    /// Probabilities for class 0 and class 1
    pub class_probabilities: [f64; 2],

    /// Scoring timestamp
    pub scored_at: DateTime<Utc>,
}

impl Prediction {
    pub fn new(label: i64, class_probabilities: [f64; 2]) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            label,
            verdict: Verdict::from_label(label),
            fraud_probability: class_probabilities[1],
            class_probabilities,
            scored_at: Utc::now(),
        }
    }

    /// Fraud probability as `NN.NN%`
    pub fn probability_percent(&self) -> String {
        format_probability(self.fraud_probability)
    }

    /// Two-line message: headline, then probability
    pub fn message(&self) -> String {
        format!(
            "{}\nProbability: {}",
            self.verdict.headline(),
            self.probability_percent()
        )
    }
}
