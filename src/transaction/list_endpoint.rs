use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    app_state::lock_connection,
    identity::ExternalIdentity,
    transaction::{
        core::{Transaction, get_transaction, get_transactions_for_user},
        form::parse_transaction_id,
    },
    user::get_or_create_user,
};

/// The state needed to list transactions.
#[derive(Debug, Clone)]
pub struct ListTransactionsState {
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListTransactionsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns all of the user's transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<ListTransactionsState>,
    identity: ExternalIdentity,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    get_transactions_for_user(user.id, &connection).map(Json)
}

/// A route handler that returns one of the user's transactions.
///
/// Responds with 404 if the transaction does not exist or belongs to another user.
pub async fn get_transaction_endpoint(
    State(state): State<ListTransactionsState>,
    identity: ExternalIdentity,
    Path(raw_transaction_id): Path<String>,
) -> Result<Json<Transaction>, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    get_transaction(transaction_id, user.id, &connection).map(Json)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        identity::ExternalIdentity,
        initialize_db,
        transaction::{
            core::create_transaction,
            list_endpoint::{
                ListTransactionsState, get_transaction_endpoint, get_transactions_endpoint,
            },
        },
        user::get_or_create_user,
        validation::{SanitizedTransaction, TransactionType},
    };

    fn identity(external_id: &str) -> ExternalIdentity {
        ExternalIdentity {
            external_id: external_id.to_owned(),
            email: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn lists_only_own_transactions() {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        let owner = get_or_create_user(&identity("owner"), &connection).unwrap();
        let other = get_or_create_user(&identity("other"), &connection).unwrap();
        let salary = SanitizedTransaction {
            description: "Salário".to_owned(),
            amount: 5000.0,
            category: "Salário".to_owned(),
            transaction_type: TransactionType::Income,
            is_fixed: false,
        };
        create_transaction(owner.id, &salary, datetime!(2025-10-01 9:00 UTC), &connection).unwrap();
        create_transaction(other.id, &salary, datetime!(2025-10-01 9:00 UTC), &connection).unwrap();
        let state = ListTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let axum::Json(transactions) = get_transactions_endpoint(State(state), identity("owner"))
            .await
            .unwrap();

        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].user_id, owner.id);
    }

    #[tokio::test]
    async fn new_user_has_no_transactions() {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        let state = ListTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let axum::Json(transactions) = get_transactions_endpoint(State(state), identity("new"))
            .await
            .unwrap();

        assert!(transactions.is_empty());
    }

    #[tokio::test]
    async fn gets_single_transaction_for_owner_only() {
        let connection = Connection::open_in_memory().unwrap();
        initialize_db(&connection).unwrap();
        let owner = get_or_create_user(&identity("owner"), &connection).unwrap();
        let created = create_transaction(
            owner.id,
            &SanitizedTransaction {
                description: "Uber".to_owned(),
                amount: 23.4,
                category: "Transporte".to_owned(),
                transaction_type: TransactionType::Expense,
                is_fixed: false,
            },
            datetime!(2025-10-02 22:15 UTC),
            &connection,
        )
        .unwrap();
        let state = ListTransactionsState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let axum::Json(got) = get_transaction_endpoint(
            State(state.clone()),
            identity("owner"),
            Path(created.id.to_string()),
        )
        .await
        .unwrap();
        let not_theirs = get_transaction_endpoint(
            State(state),
            identity("other"),
            Path(created.id.to_string()),
        )
        .await;

        assert_eq!(got, created);
        assert_eq!(not_theirs.err(), Some(Error::NotFound));
    }
}
