//! Input form values as submitted by the browser

use crate::error::InferenceError;
use crate::types::transaction::{TransactionRecord, TransactionType};
use serde::Deserialize;

/// Raw form fields, kept as text so a rejected submission can be re-rendered
/// exactly as entered.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredictForm {
    #[serde(rename = "type", default)]
    pub transaction_type: String,
    #[serde(default)]
    pub amount: String,
    #[serde(rename = "oldbalanceOrg", default)]
    pub old_balance_orig: String,
    #[serde(rename = "newbalanceOrig", default)]
    pub new_balance_orig: String,
    #[serde(rename = "oldbalanceDest", default)]
    pub old_balance_dest: String,
    #[serde(rename = "newbalanceDest", default)]
    pub new_balance_dest: String,
}

impl Default for PredictForm {
    fn default() -> Self {
        Self::from_record(&TransactionRecord::default())
    }
}

impl PredictForm {
    /// Form pre-filled with a record's values
    pub fn from_record(record: &TransactionRecord) -> Self {
        Self {
            transaction_type: record.transaction_type.as_str().to_string(),
            amount: format_amount(record.amount),
            old_balance_orig: format_amount(record.old_balance_orig),
            new_balance_orig: format_amount(record.new_balance_orig),
            old_balance_dest: format_amount(record.old_balance_dest),
            new_balance_dest: format_amount(record.new_balance_dest),
        }
    }

    /// `(schema name, label, raw value)` for each numeric input, in schema order
    pub fn numeric_inputs(&self) -> [(&'static str, &'static str, &str); 5] {
        [
            ("amount", "Amount", self.amount.as_str()),
            ("oldbalanceOrg", "Old Balance Origin", self.old_balance_orig.as_str()),
            ("newbalanceOrig", "New Balance Origin", self.new_balance_orig.as_str()),
            ("oldbalanceDest", "Old Balance Destination", self.old_balance_dest.as_str()),
            ("newbalanceDest", "New Balance Destination", self.new_balance_dest.as_str()),
        ]
    }

    /// Parse and validate into a transaction record
    pub fn to_record(&self) -> Result<TransactionRecord, InferenceError> {
        let transaction_type: TransactionType = self
            .transaction_type
            .parse()
            .map_err(InferenceError::InvalidInput)?;

        let record = TransactionRecord {
            transaction_type,
            amount: parse_amount("amount", &self.amount)?,
            old_balance_orig: parse_amount("oldbalanceOrg", &self.old_balance_orig)?,
            new_balance_orig: parse_amount("newbalanceOrig", &self.new_balance_orig)?,
            old_balance_dest: parse_amount("oldbalanceDest", &self.old_balance_dest)?,
            new_balance_dest: parse_amount("newbalanceDest", &self.new_balance_dest)?,
        };

        record.validate().map_err(InferenceError::InvalidInput)?;
        Ok(record)
    }
}

fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn parse_amount(name: &str, raw: &str) -> Result<f64, InferenceError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(InferenceError::InvalidInput(format!("{} is required", name)));
    }
    raw.parse::<f64>().map_err(|_| {
        InferenceError::InvalidInput(format!("{} must be a number (got '{}')", name, raw))
    })
}
