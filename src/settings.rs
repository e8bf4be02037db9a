//! Per-user budget settings: the monthly budget for variable expenses and
//! the expected monthly income.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::Form;
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};

use crate::{
    ActionResponse, AppState, Error,
    app_state::lock_connection,
    identity::ExternalIdentity,
    user::{UserId, get_or_create_user},
    validation::{ValidationError, ValidationResult, round_to_cents},
};

/// A user's budget settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// The amount the user plans to spend on variable expenses each month.
    pub monthly_budget: f64,
    /// The amount the user expects to earn each month.
    pub monthly_income: f64,
}

/// Create the user_settings table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_user_settings_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user_settings (
            user_id INTEGER PRIMARY KEY,
            monthly_budget REAL NOT NULL DEFAULT 0,
            monthly_income REAL NOT NULL DEFAULT 0,
            FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
        )",
        (),
    )?;

    Ok(())
}

/// Get the settings for `user_id`, or all zeros if the user never saved any.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn get_user_settings(user_id: UserId, connection: &Connection) -> Result<UserSettings, Error> {
    let settings = connection
        .query_row(
            "SELECT monthly_budget, monthly_income FROM user_settings WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| {
                Ok(UserSettings {
                    monthly_budget: row.get(0)?,
                    monthly_income: row.get(1)?,
                })
            },
        )
        .optional()?;

    Ok(settings.unwrap_or_default())
}

/// Insert or replace the settings for `user_id`.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn save_user_settings(
    user_id: UserId,
    settings: UserSettings,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO user_settings (user_id, monthly_budget, monthly_income) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
            monthly_budget = excluded.monthly_budget,
            monthly_income = excluded.monthly_income",
        params![
            user_id.as_i64(),
            settings.monthly_budget,
            settings.monthly_income
        ],
    )?;

    Ok(())
}

/// The form for saving budget settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsForm {
    /// The monthly budget for variable expenses as typed by the user.
    #[serde(rename = "monthlyBudget")]
    pub monthly_budget: Option<String>,
    /// The expected monthly income as typed by the user.
    #[serde(rename = "monthlyIncome")]
    pub monthly_income: Option<String>,
}

impl SettingsForm {
    /// Parse both values, each of which must be a finite, non-negative number.
    ///
    /// # Errors
    /// Returns [ValidationError::InvalidAmount] if either value is missing,
    /// not a number or negative.
    pub fn validate(&self) -> ValidationResult<UserSettings> {
        Ok(UserSettings {
            monthly_budget: parse_setting(self.monthly_budget.as_deref())?,
            monthly_income: parse_setting(self.monthly_income.as_deref())?,
        })
    }
}

fn parse_setting(raw_value: Option<&str>) -> ValidationResult<f64> {
    match raw_value.map(|value| value.trim().parse::<f64>()) {
        Some(Ok(value)) if value.is_finite() && value >= 0.0 => Ok(round_to_cents(value)),
        _ => Err(ValidationError::InvalidAmount),
    }
}

/// The state needed to read and save budget settings.
#[derive(Debug, Clone)]
pub struct SettingsState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SettingsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the user's budget settings.
pub async fn get_settings_endpoint(
    State(state): State<SettingsState>,
    identity: ExternalIdentity,
) -> Result<Json<UserSettings>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    get_user_settings(user.id, &connection).map(Json)
}

/// A route handler that saves the user's budget settings.
pub async fn save_settings_endpoint(
    State(state): State<SettingsState>,
    identity: ExternalIdentity,
    Form(form): Form<SettingsForm>,
) -> Result<ActionResponse, Error> {
    let settings = form.validate().inspect_err(|error| {
        tracing::warn!("Rejected settings from {}: {error}", identity.external_id);
    })?;

    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    save_user_settings(user.id, settings, &connection)
        .inspect_err(|error| tracing::error!("Could not save settings for {}: {error}", user.id))?;

    Ok(ActionResponse::ok())
}
