//! Defines the endpoint for creating a new transaction.
use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use rusqlite::Connection;
use time::OffsetDateTime;

use crate::{
    ActionResponse, AppState, Error,
    app_state::lock_connection,
    duplicate::DuplicateGuard,
    identity::ExternalIdentity,
    transaction::{core::create_transaction, form::TransactionForm},
    user::get_or_create_user,
    validation::{create_duplicate_key, validate_transaction_data},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Rejects repeats of recently created transactions.
    pub duplicate_guard: DuplicateGuard,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            duplicate_guard: state.duplicate_guard.clone(),
        }
    }
}

/// A route handler for creating a new transaction dated now.
///
/// Responds with 201 Created on success, or an [ActionResponse] carrying the
/// validation message, or 409 Conflict if the same transaction was created
/// moments ago.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    identity: ExternalIdentity,
    Form(form): Form<TransactionForm>,
) -> Result<Response, Error> {
    let transaction = validate_transaction_data(&form.into_input()).inspect_err(|error| {
        tracing::warn!("Rejected transaction from {}: {error}", identity.external_id);
    })?;

    // The connection lock is held from the duplicate check until the key is
    // recorded so that two identical requests cannot both pass the check.
    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    let duplicate_key = create_duplicate_key(
        &identity.external_id,
        &transaction.description,
        transaction.amount,
        transaction.transaction_type,
    );

    if state.duplicate_guard.is_duplicate(&duplicate_key) {
        tracing::warn!("Rejected duplicate transaction {duplicate_key}");
        return Err(Error::DuplicateTransaction);
    }

    let created = create_transaction(user.id, &transaction, OffsetDateTime::now_utc(), &connection)
        .inspect_err(|error| tracing::error!("could not create transaction: {error}"))?;

    state.duplicate_guard.record(&duplicate_key);
    tracing::info!("Created transaction {} for user {}", created.id, user.id);

    Ok((StatusCode::CREATED, ActionResponse::ok()).into_response())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use axum::{extract::State, http::StatusCode, response::IntoResponse};
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        Error,
        db::initialize,
        duplicate::{DuplicateGuard, ManualClock},
        identity::ExternalIdentity,
        transaction::{
            core::{count_transactions, get_transactions_for_user},
            create_endpoint::{CreateTransactionState, create_transaction_endpoint},
            form::TransactionForm,
        },
        user::get_user_by_external_id,
        validation::ValidationError,
    };

    fn get_test_state() -> (CreateTransactionState, Arc<ManualClock>) {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        let clock = Arc::new(ManualClock::new());

        let state = CreateTransactionState {
            db_connection: Arc::new(Mutex::new(conn)),
            duplicate_guard: DuplicateGuard::new(clock.clone()),
        };

        (state, clock)
    }

    fn identity() -> ExternalIdentity {
        ExternalIdentity {
            external_id: "user_1".to_owned(),
            email: Some("ana@example.com".to_owned()),
            name: Some("Ana".to_owned()),
        }
    }

    fn coffee_form() -> TransactionForm {
        TransactionForm {
            description: Some("Café".to_owned()),
            amount: Some("15.5".to_owned()),
            category: Some("Alimentação".to_owned()),
            transaction_type: Some("EXPENSE".to_owned()),
            is_fixed: None,
        }
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, _) = get_test_state();

        let response =
            create_transaction_endpoint(State(state.clone()), identity(), Form(coffee_form()))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_external_id("user_1", &connection)
            .unwrap()
            .expect("user should have been created");
        let transactions = get_transactions_for_user(user.id, &connection).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].description, "Café");
        assert_eq!(transactions[0].amount, 15.5);
    }

    #[tokio::test]
    async fn invalid_transaction_is_not_saved() {
        let (state, _) = get_test_state();
        let form = TransactionForm {
            category: Some("Aluguel/Condomínio".to_owned()),
            transaction_type: Some("INCOME".to_owned()),
            ..coffee_form()
        };

        let result = create_transaction_endpoint(State(state.clone()), identity(), Form(form)).await;

        assert_eq!(
            result.err(),
            Some(Error::Validation(ValidationError::CategoryNotValidForIncome))
        );
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn rejects_duplicate_within_window() {
        let (state, _) = get_test_state();
        create_transaction_endpoint(State(state.clone()), identity(), Form(coffee_form()))
            .await
            .unwrap();
        let same_but_shouting = TransactionForm {
            description: Some("CAFÉ".to_owned()),
            ..coffee_form()
        };

        let result =
            create_transaction_endpoint(State(state.clone()), identity(), Form(same_but_shouting))
                .await;

        assert_eq!(result.err(), Some(Error::DuplicateTransaction));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 1);
    }

    #[tokio::test]
    async fn accepts_repeat_after_window() {
        let (state, clock) = get_test_state();
        create_transaction_endpoint(State(state.clone()), identity(), Form(coffee_form()))
            .await
            .unwrap();

        clock.advance(Duration::from_millis(2000));
        let result =
            create_transaction_endpoint(State(state.clone()), identity(), Form(coffee_form()))
                .await;

        assert!(result.is_ok());
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 2);
    }

    #[tokio::test]
    async fn different_users_do_not_collide() {
        let (state, _) = get_test_state();
        create_transaction_endpoint(State(state.clone()), identity(), Form(coffee_form()))
            .await
            .unwrap();
        let someone_else = ExternalIdentity {
            external_id: "user_2".to_owned(),
            email: None,
            name: None,
        };

        let result =
            create_transaction_endpoint(State(state.clone()), someone_else, Form(coffee_form()))
                .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn rejected_submission_does_not_arm_duplicate_window() {
        let (state, _) = get_test_state();
        let too_long = TransactionForm {
            description: Some("a".repeat(201)),
            ..coffee_form()
        };
        let _ = create_transaction_endpoint(State(state.clone()), identity(), Form(too_long)).await;

        assert!(state.duplicate_guard.is_empty());
    }
}
