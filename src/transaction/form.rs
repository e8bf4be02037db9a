//! The form submitted to create or edit a transaction.

use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::TransactionId,
    validation::{TransactionInput, ValidationError, validate_id},
};

/// The raw form fields for a transaction.
///
/// Every field is optional text so that missing or malformed values reach
/// the validator and get a proper error message instead of a generic
/// deserialisation failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub description: Option<String>,
    /// The value of the transaction as typed by the user.
    pub amount: Option<String>,
    /// The category name.
    pub category: Option<String>,
    /// "INCOME" or "EXPENSE".
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    /// The "fixed expense" checkbox.
    #[serde(rename = "isFixed")]
    pub is_fixed: Option<String>,
}

impl TransactionForm {
    /// Convert the text fields into the shape expected by the validator.
    ///
    /// An amount that is not a number becomes `None`. The fixed flag follows
    /// HTML checkbox semantics: "on" or "true" means checked, anything else
    /// (including no value) means unchecked.
    pub fn into_input(self) -> TransactionInput {
        TransactionInput {
            description: self.description,
            amount: self
                .amount
                .as_deref()
                .and_then(|amount| amount.trim().parse::<f64>().ok()),
            category: self.category,
            transaction_type: self.transaction_type,
            is_fixed: Some(matches!(self.is_fixed.as_deref(), Some("on" | "true"))),
        }
    }
}

/// Validate a transaction ID taken from the request path.
///
/// # Errors
///
/// Returns [ValidationError::InvalidId] if `raw_id` is blank or not an integer.
pub fn parse_transaction_id(raw_id: &str) -> Result<TransactionId, Error> {
    let id = validate_id(Some(raw_id))?;

    id.parse()
        .map_err(|_| Error::Validation(ValidationError::InvalidId))
}
