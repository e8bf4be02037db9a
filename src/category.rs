//! The fixed vocabulary of transaction categories.
//!
//! Categories are split into three named lists: income, fixed (recurring
//! monthly) expenses and variable (discretionary) expenses. Which lists a
//! category may be drawn from depends on the [TransactionType].

use axum::Json;
use serde::Serialize;

use crate::validation::TransactionType;

/// Categories for money coming in.
pub const INCOME_CATEGORIES: &[&str] = &[
    "Salário",
    "Freelancer",
    "Renda Extra",
    "Dividendos",
    "Outros",
];

/// Categories for recurring monthly expenses, e.g. rent or subscriptions.
pub const FIXED_EXPENSE_CATEGORIES: &[&str] = &[
    "Aluguel/Condomínio",
    "Internet/Luz/Água",
    "Parcela Dívida",
    "Assinaturas",
    "Seguro",
];

/// Categories for discretionary expenses.
pub const VARIABLE_EXPENSE_CATEGORIES: &[&str] = &[
    "Alimentação",
    "Transporte",
    "Lazer",
    "Compras",
    "Saúde/Farmácia",
];

/// Whether `category` appears in any of the category lists.
pub fn is_known_category(category: &str) -> bool {
    INCOME_CATEGORIES.contains(&category)
        || FIXED_EXPENSE_CATEGORIES.contains(&category)
        || VARIABLE_EXPENSE_CATEGORIES.contains(&category)
}

/// Whether `category` may be used for a transaction of type `transaction_type`.
///
/// Income transactions may only use [INCOME_CATEGORIES], expenses may use
/// either [FIXED_EXPENSE_CATEGORIES] or [VARIABLE_EXPENSE_CATEGORIES].
pub fn is_valid_for_type(category: &str, transaction_type: TransactionType) -> bool {
    match transaction_type {
        TransactionType::Income => INCOME_CATEGORIES.contains(&category),
        TransactionType::Expense => {
            FIXED_EXPENSE_CATEGORIES.contains(&category)
                || VARIABLE_EXPENSE_CATEGORIES.contains(&category)
        }
    }
}

/// The category lists as sent to clients.
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CategoryLists {
    income: &'static [&'static str],
    expense_fixed: &'static [&'static str],
    expense_variable: &'static [&'static str],
}

/// A route handler that returns the category vocabulary.
pub async fn get_categories() -> Json<CategoryLists> {
    Json(CategoryLists {
        income: INCOME_CATEGORIES,
        expense_fixed: FIXED_EXPENSE_CATEGORIES,
        expense_variable: VARIABLE_EXPENSE_CATEGORIES,
    })
}
