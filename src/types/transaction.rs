//! Transaction record submitted for fraud scoring

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transaction categories the model was trained on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    #[default]
    Payment,
    Transfer,
    CashOut,
}

impl TransactionType {
    /// All selectable types, in display order
    pub const ALL: [TransactionType; 3] = [
        TransactionType::Payment,
        TransactionType::Transfer,
        TransactionType::CashOut,
    ];

    /// Category label as the model expects it
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payment => "PAYMENT",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::CashOut => "CASH_OUT",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| {
                format!(
                    "transaction type must be one of PAYMENT, TRANSFER, CASH_OUT (got '{}')",
                    s
                )
            })
    }
}

/// A single transaction to be scored.
///
/// Serialized field names are the column names of the model's feature schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Transaction category
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Transaction amount
    pub amount: f64,

    /// Origin balance before the transaction
    #[serde(rename = "oldbalanceOrg")]
    pub old_balance_orig: f64,

    /// Origin balance after the transaction
    #[serde(rename = "newbalanceOrig")]
    pub new_balance_orig: f64,

    /// Destination balance before the transaction
    #[serde(rename = "oldbalanceDest")]
    pub old_balance_dest: f64,

    /// Destination balance after the transaction
    #[serde(rename = "newbalanceDest")]
    pub new_balance_dest: f64,
}

impl TransactionRecord {
    /// Numeric fields paired with their schema names, in schema order
    pub fn numeric_fields(&self) -> [(&'static str, f64); 5] {
        [
            ("amount", self.amount),
            ("oldbalanceOrg", self.old_balance_orig),
            ("newbalanceOrig", self.new_balance_orig),
            ("oldbalanceDest", self.old_balance_dest),
            ("newbalanceDest", self.new_balance_dest),
        ]
    }

    /// Check that every numeric field is finite and non-negative
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in self.numeric_fields() {
            if !value.is_finite() {
                return Err(format!("{} must be a finite number", name));
            }
            if value < 0.0 {
                return Err(format!("{} must be >= 0 (got {})", name, value));
            }
        }
        Ok(())
    }
}

impl Default for TransactionRecord {
    fn default() -> Self {
        Self {
            transaction_type: TransactionType::Payment,
            amount: 1000.0,
            old_balance_orig: 5000.0,
            new_balance_orig: 4000.0,
            old_balance_dest: 0.0,
            new_balance_dest: 0.0,
        }
    }
}
