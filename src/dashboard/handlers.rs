//! Dashboard HTTP handlers.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    dashboard::summary::{DashboardSummary, summarize},
    identity::ExternalIdentity,
    settings::get_user_settings,
    timezone::get_local_offset,
    transaction::get_transactions_for_user,
    user::get_or_create_user,
};

/// The state needed for the dashboard.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading transactions and settings.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler that returns the user's dashboard summary for today.
pub async fn get_dashboard_endpoint(
    State(state): State<DashboardState>,
    identity: ExternalIdentity,
) -> Result<Json<DashboardSummary>, Error> {
    let local_offset = get_local_offset(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;
    let today = OffsetDateTime::now_utc().to_offset(local_offset).date();

    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;
    let transactions = get_transactions_for_user(user.id, &connection)?;
    let settings = get_user_settings(user.id, &connection)?;

    Ok(Json(summarize(&transactions, settings, today, local_offset)))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State};
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        Error,
        dashboard::handlers::{DashboardState, get_dashboard_endpoint},
        db::initialize,
        identity::ExternalIdentity,
        settings::{UserSettings, save_user_settings},
        transaction::create_transaction,
        user::get_or_create_user,
        validation::{SanitizedTransaction, TransactionType},
    };

    fn identity() -> ExternalIdentity {
        ExternalIdentity {
            external_id: "user_1".to_owned(),
            email: None,
            name: None,
        }
    }

    fn get_test_state(local_timezone: &str) -> DashboardState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        DashboardState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: local_timezone.to_owned(),
        }
    }

    #[tokio::test]
    async fn summarizes_users_data() {
        let state = get_test_state("Etc/UTC");
        {
            let connection = state.db_connection.lock().unwrap();
            let user = get_or_create_user(&identity(), &connection).unwrap();
            create_transaction(
                user.id,
                &SanitizedTransaction {
                    description: "Salário".to_owned(),
                    amount: 5000.0,
                    category: "Salário".to_owned(),
                    transaction_type: TransactionType::Income,
                    is_fixed: false,
                },
                OffsetDateTime::now_utc(),
                &connection,
            )
            .unwrap();
            create_transaction(
                user.id,
                &SanitizedTransaction {
                    description: "Mercado".to_owned(),
                    amount: 250.0,
                    category: "Alimentação".to_owned(),
                    transaction_type: TransactionType::Expense,
                    is_fixed: false,
                },
                OffsetDateTime::now_utc(),
                &connection,
            )
            .unwrap();
            save_user_settings(
                user.id,
                UserSettings {
                    monthly_budget: 1000.0,
                    monthly_income: 5000.0,
                },
                &connection,
            )
            .unwrap();
        }

        let Json(summary) = get_dashboard_endpoint(State(state), identity())
            .await
            .unwrap();

        assert_eq!(summary.total_income, 5000.0);
        assert_eq!(summary.variable_expenses, 250.0);
        assert_eq!(summary.variable_goal, 1000.0);
        assert_eq!(summary.variable_progress, 25.0);
        assert_eq!(summary.recent_transactions.len(), 2);
        assert_eq!(summary.expense_chart.len(), 1);
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let state = get_test_state("Not/AZone");

        let result = get_dashboard_endpoint(State(state), identity()).await;

        assert_eq!(
            result.err(),
            Some(Error::InvalidTimezoneError("Not/AZone".to_owned()))
        );
    }
}
