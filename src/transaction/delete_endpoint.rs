use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, Path, State};
use rusqlite::Connection;

use crate::{
    ActionResponse, AppState, Error,
    app_state::lock_connection,
    identity::ExternalIdentity,
    transaction::{core::delete_transaction, form::parse_transaction_id},
    user::get_or_create_user,
};

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting one of the user's transactions.
///
/// Responds with 404 if the transaction does not exist or belongs to another user.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    identity: ExternalIdentity,
    Path(raw_transaction_id): Path<String>,
) -> Result<ActionResponse, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;

    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    match delete_transaction(transaction_id, user.id, &connection) {
        Ok(0) => Err(Error::DeleteMissingTransaction),
        Ok(_) => {
            tracing::info!("Deleted transaction {transaction_id} for user {}", user.id);
            Ok(ActionResponse::ok())
        }
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            Err(error)
        }
    }
}
