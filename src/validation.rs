//! Server-side validation and sanitisation of submitted transactions.
//!
//! Every transaction that reaches the database goes through
//! [validate_transaction_data] first, regardless of what the client checked.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::category::{is_known_category, is_valid_for_type};

/// The longest description accepted, in characters.
pub const DESCRIPTION_MAX_LENGTH: usize = 200;
/// The smallest amount accepted.
pub const AMOUNT_MIN: f64 = 0.01;
/// The largest amount accepted (one billion).
pub const AMOUNT_MAX: f64 = 1_000_000_000.0;

/// Whether money came in or went out.
///
/// Serialised as `"INCOME"` and `"EXPENSE"`, which are also the values
/// accepted by [FromStr].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The wire representation of the transaction type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Income => "INCOME",
            TransactionType::Expense => "EXPENSE",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ValidationError;

    /// Only the exact strings "INCOME" and "EXPENSE" are accepted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCOME" => Ok(TransactionType::Income),
            "EXPENSE" => Ok(TransactionType::Expense),
            _ => Err(ValidationError::InvalidType),
        }
    }
}

/// The raw fields of a submitted transaction.
///
/// A field that was absent or could not be read as the expected type is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionInput {
    /// Free text describing the transaction.
    pub description: Option<String>,
    /// The value of the transaction.
    pub amount: Option<f64>,
    /// One of the known category names.
    pub category: Option<String>,
    /// Should be either "INCOME" or "EXPENSE".
    pub transaction_type: Option<String>,
    /// Whether the expense recurs every month.
    pub is_fixed: Option<bool>,
}

/// A transaction that passed validation and is safe to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct SanitizedTransaction {
    /// The trimmed description.
    pub description: String,
    /// The amount rounded to cents.
    pub amount: f64,
    /// The trimmed category.
    pub category: String,
    /// The transaction type.
    pub transaction_type: TransactionType,
    /// Always false for income.
    pub is_fixed: bool,
}

/// The reasons a submitted transaction can be rejected.
///
/// The messages are shown to the end user as is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// The description was absent or an empty string.
    #[error("Descrição é obrigatória e deve ser texto")]
    MissingDescription,

    /// The description only contained whitespace.
    #[error("Descrição não pode estar vazia")]
    EmptyDescription,

    /// The description is longer than [DESCRIPTION_MAX_LENGTH].
    #[error("Descrição muito longa (máximo 200 caracteres)")]
    DescriptionTooLong,

    /// The amount was absent or not a number.
    #[error("Valor inválido - deve ser um número")]
    InvalidAmount,

    /// The amount is below [AMOUNT_MIN].
    #[error("Valor deve ser maior que zero")]
    AmountNotPositive,

    /// The amount is above [AMOUNT_MAX].
    #[error("Valor muito grande (máximo 1 bilhão)")]
    AmountTooLarge,

    /// The type was neither "INCOME" nor "EXPENSE".
    #[error("Tipo de transação inválido (deve ser INCOME ou EXPENSE)")]
    InvalidType,

    /// The category was absent or an empty string.
    #[error("Categoria é obrigatória")]
    MissingCategory,

    /// The category is not in any of the category lists.
    #[error("Categoria inválida: \"{0}\"")]
    UnknownCategory(String),

    /// An income transaction used an expense category.
    #[error("Categoria não é válida para receitas (INCOME)")]
    CategoryNotValidForIncome,

    /// An expense transaction used an income category.
    #[error("Categoria não é válida para despesas (EXPENSE)")]
    CategoryNotValidForExpense,

    /// An ID was absent or blank.
    #[error("ID inválido ou não fornecido")]
    InvalidId,
}

/// Either the validated value or the reason it was rejected.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate and sanitise the raw fields of a transaction.
///
/// Checks run in field order (description, amount, type, category, fixed
/// flag) and the first failure is returned.
///
/// # Errors
///
/// Returns the [ValidationError] describing the first rule that `input` breaks.
pub fn validate_transaction_data(input: &TransactionInput) -> ValidationResult<SanitizedTransaction> {
    let description = match input.description.as_deref() {
        None | Some("") => return Err(ValidationError::MissingDescription),
        Some(description) => description.trim(),
    };

    if description.is_empty() {
        return Err(ValidationError::EmptyDescription);
    }

    // Counted in UTF-16 code units, as browsers count form input length.
    if description.encode_utf16().count() > DESCRIPTION_MAX_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }

    let amount = match input.amount {
        Some(amount) if !amount.is_nan() => amount,
        _ => return Err(ValidationError::InvalidAmount),
    };

    if amount < AMOUNT_MIN {
        return Err(ValidationError::AmountNotPositive);
    }

    if amount > AMOUNT_MAX {
        return Err(ValidationError::AmountTooLarge);
    }

    let amount = round_to_cents(amount);

    let transaction_type: TransactionType = input
        .transaction_type
        .as_deref()
        .ok_or(ValidationError::InvalidType)?
        .parse()?;

    let category = match input.category.as_deref() {
        None | Some("") => return Err(ValidationError::MissingCategory),
        Some(category) => category.trim(),
    };

    if !is_known_category(category) {
        return Err(ValidationError::UnknownCategory(category.to_owned()));
    }

    if !is_valid_for_type(category, transaction_type) {
        return Err(match transaction_type {
            TransactionType::Income => ValidationError::CategoryNotValidForIncome,
            TransactionType::Expense => ValidationError::CategoryNotValidForExpense,
        });
    }

    // Only expenses can be fixed.
    let is_fixed = match transaction_type {
        TransactionType::Income => false,
        TransactionType::Expense => input.is_fixed.unwrap_or(false),
    };

    Ok(SanitizedTransaction {
        description: description.to_owned(),
        amount,
        category: category.to_owned(),
        transaction_type,
        is_fixed,
    })
}

/// Round `amount` to two decimal places, with halves rounded away from zero.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Check that `id` is a non-blank identifier and return it trimmed.
///
/// # Errors
///
/// Returns [ValidationError::InvalidId] if `id` is `None` or only whitespace.
pub fn validate_id(id: Option<&str>) -> ValidationResult<String> {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_owned()),
        _ => Err(ValidationError::InvalidId),
    }
}

/// Build the key used to detect repeated submissions of the same transaction.
///
/// Two submissions from the same user with the same type, the same
/// description ignoring case and the same amount to the cent produce the
/// same key.
pub fn create_duplicate_key(
    user_id: &str,
    description: &str,
    amount: f64,
    transaction_type: TransactionType,
) -> String {
    format!(
        "{user_id}:{transaction_type}:{}:{amount:.2}",
        description.to_lowercase()
    )
}
