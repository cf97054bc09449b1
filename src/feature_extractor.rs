//! Feature row construction for model inference.
//!
//! Builds the single-row table the model was fitted on. Column names,
//! kinds and order here are the contract with the exported pipeline.

use crate::types::transaction::TransactionRecord;

/// Kind of value a schema column holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Categorical,
    Numeric,
}

/// Feature schema of the fraud pipeline, in training order
pub const FEATURE_SCHEMA: [(&str, FeatureKind); 6] = [
    ("type", FeatureKind::Categorical),
    ("amount", FeatureKind::Numeric),
    ("oldbalanceOrg", FeatureKind::Numeric),
    ("newbalanceOrig", FeatureKind::Numeric),
    ("oldbalanceDest", FeatureKind::Numeric),
    ("newbalanceDest", FeatureKind::Numeric),
];

/// A single cell of the feature row
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Categorical(String),
    Numeric(f64),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Categorical(_) => FeatureKind::Categorical,
            FeatureValue::Numeric(_) => FeatureKind::Numeric,
        }
    }
}

/// One-row table keyed by column name, preserving insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRow {
    columns: Vec<(String, FeatureValue)>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column
    pub fn push(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.columns.push((name.into(), value));
    }

    /// Builder-style [`push`](Self::push)
    pub fn with(mut self, name: impl Into<String>, value: FeatureValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn columns(&self) -> &[(String, FeatureValue)] {
        &self.columns
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Compare a set of column names against [`FEATURE_SCHEMA`].
///
/// Returns a description of missing and unexpected columns on mismatch.
pub fn check_schema<'a, I>(names: I) -> Result<(), String>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = names.into_iter().collect();

    let missing: Vec<&str> = FEATURE_SCHEMA
        .iter()
        .map(|(name, _)| *name)
        .filter(|name| !names.contains(name))
        .collect();

    let unexpected: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !FEATURE_SCHEMA.iter().any(|(s, _)| s == name))
        .collect();

    if missing.is_empty() && unexpected.is_empty() {
        return Ok(());
    }

    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing columns [{}]", missing.join(", ")));
    }
    if !unexpected.is_empty() {
        parts.push(format!("unexpected columns [{}]", unexpected.join(", ")));
    }
    Err(parts.join("; "))
}

/// Turns transaction records into model input rows.
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Build the feature row for a transaction, in schema order
    pub fn extract(&self, tx: &TransactionRecord) -> FeatureRow {
        let mut row = FeatureRow::new();
        row.push(
            "type",
            FeatureValue::Categorical(tx.transaction_type.as_str().to_string()),
        );
        for (name, value) in tx.numeric_fields() {
            row.push(name, FeatureValue::Numeric(value));
        }
        row
    }

    pub fn feature_count(&self) -> usize {
        FEATURE_SCHEMA.len()
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        FEATURE_SCHEMA.iter().map(|(name, _)| *name).collect()
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}
