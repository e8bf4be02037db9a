//! The arithmetic behind the dashboard.
//!
//! Everything here is pure: the caller supplies the transactions, the budget
//! settings and the local date, so the figures can be tested without a
//! database or a clock.

use serde::Serialize;
use time::{Date, UtcOffset};

use crate::{settings::UserSettings, transaction::Transaction, validation::TransactionType};

/// How many transactions are shown in the "recent transactions" table.
pub const RECENT_TRANSACTION_COUNT: usize = 5;

/// How many days of expenses are shown in the expense chart.
pub const EXPENSE_CHART_DAYS: usize = 7;

/// The total spent on one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseDay {
    /// The day formatted as "dd/mm".
    pub date: String,
    /// The sum of the day's expenses.
    pub amount: f64,
}

/// The figures shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// The sum of all income.
    pub total_income: f64,
    /// The sum of all fixed expenses.
    pub fixed_expenses: f64,
    /// The sum of all variable expenses.
    pub variable_expenses: f64,
    /// Income minus all expenses.
    pub current_balance: f64,
    /// The monthly budget for variable expenses, zero if not set.
    pub variable_goal: f64,
    /// The income the user expects each month, zero if not set.
    pub monthly_income: f64,
    /// How much of the variable budget is left, negative if overspent.
    pub remaining_variable_budget: f64,
    /// The number of days left in the current month, not counting today.
    pub days_remaining: u8,
    /// How much can be spent per day for the rest of the month.
    pub daily_cap: f64,
    /// Percentage of the variable budget spent, capped at 100.
    pub variable_progress: f64,
    /// What is expected to be left at the end of the month.
    pub projected_balance: f64,
    /// The newest transactions, newest first.
    pub recent_transactions: Vec<Transaction>,
    /// Expenses per day for the most recent days with expenses, oldest first.
    pub expense_chart: Vec<ExpenseDay>,
}

/// Compute the dashboard figures for `today`.
///
/// `transactions` may be in any order. `local_offset` decides which calendar
/// day a transaction falls on in the expense chart.
pub fn summarize(
    transactions: &[Transaction],
    settings: UserSettings,
    today: Date,
    local_offset: UtcOffset,
) -> DashboardSummary {
    let mut newest_first: Vec<&Transaction> = transactions.iter().collect();
    newest_first.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let mut total_income = 0.0;
    let mut fixed_expenses = 0.0;
    let mut variable_expenses = 0.0;

    for transaction in &newest_first {
        match (transaction.transaction_type, transaction.is_fixed) {
            (TransactionType::Income, _) => total_income += transaction.amount,
            (TransactionType::Expense, true) => fixed_expenses += transaction.amount,
            (TransactionType::Expense, false) => variable_expenses += transaction.amount,
        }
    }

    let variable_goal = settings.monthly_budget;
    let remaining_variable_budget = variable_goal - variable_expenses;
    let days_remaining = days_in_month(today) - today.day();

    let daily_cap = if days_remaining > 0 {
        remaining_variable_budget / f64::from(days_remaining)
    } else {
        remaining_variable_budget
    };

    let variable_progress = if variable_goal > 0.0 {
        (variable_expenses / variable_goal * 100.0).min(100.0)
    } else {
        0.0
    };

    // With no income recorded yet a negative projection is just noise.
    let projected_balance = if total_income > 0.0 {
        total_income - fixed_expenses - variable_goal
    } else {
        0.0
    };

    DashboardSummary {
        total_income,
        fixed_expenses,
        variable_expenses,
        current_balance: total_income - (fixed_expenses + variable_expenses),
        variable_goal,
        monthly_income: settings.monthly_income,
        remaining_variable_budget,
        days_remaining,
        daily_cap,
        variable_progress,
        projected_balance,
        recent_transactions: newest_first
            .iter()
            .take(RECENT_TRANSACTION_COUNT)
            .map(|transaction| (*transaction).clone())
            .collect(),
        expense_chart: expense_chart(&newest_first, local_offset),
    }
}

/// Group expenses by local calendar day, keep the most recent
/// [EXPENSE_CHART_DAYS] days and return them oldest first.
fn expense_chart(newest_first: &[&Transaction], local_offset: UtcOffset) -> Vec<ExpenseDay> {
    let mut days: Vec<(Date, f64)> = Vec::new();

    for transaction in newest_first
        .iter()
        .filter(|transaction| transaction.transaction_type == TransactionType::Expense)
    {
        let day = transaction.date.to_offset(local_offset).date();

        match days.iter_mut().find(|(date, _)| *date == day) {
            Some((_, total)) => *total += transaction.amount,
            None => days.push((day, transaction.amount)),
        }
    }

    days.into_iter()
        .take(EXPENSE_CHART_DAYS)
        .rev()
        .map(|(date, amount)| ExpenseDay {
            date: format!("{:02}/{:02}", date.day(), u8::from(date.month())),
            amount,
        })
        .collect()
}

fn days_in_month(date: Date) -> u8 {
    (28..=31)
        .rev()
        .find(|&day| date.replace_day(day).is_ok())
        .unwrap_or(28)
}
