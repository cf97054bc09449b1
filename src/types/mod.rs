//! Type definitions for the fraud prediction app

pub mod transaction;
pub mod verdict;

pub use transaction::{TransactionRecord, TransactionType};
pub use verdict::{Prediction, Verdict};
