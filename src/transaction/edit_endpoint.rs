use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, Path, State};
use axum_extra::extract::Form;
use rusqlite::Connection;

use crate::{
    ActionResponse, AppState, Error,
    app_state::lock_connection,
    duplicate::DuplicateGuard,
    identity::ExternalIdentity,
    transaction::{
        core::update_transaction,
        form::{TransactionForm, parse_transaction_id},
    },
    user::get_or_create_user,
    validation::{create_duplicate_key, validate_transaction_data},
};

/// The state needed to edit a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// Rejects repeats of recently saved transactions.
    pub duplicate_guard: DuplicateGuard,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            duplicate_guard: state.duplicate_guard.clone(),
        }
    }
}

/// A route handler for replacing the fields of one of the user's transactions.
///
/// Edits go through the same validation and duplicate suppression as new
/// transactions. The duplicate key does not include the transaction ID, so
/// saving an edit that matches a transaction created in the last two seconds
/// is rejected as a duplicate.
pub async fn edit_transaction_endpoint(
    State(state): State<EditTransactionState>,
    identity: ExternalIdentity,
    Path(raw_transaction_id): Path<String>,
    Form(form): Form<TransactionForm>,
) -> Result<ActionResponse, Error> {
    let transaction_id = parse_transaction_id(&raw_transaction_id)?;
    let transaction = validate_transaction_data(&form.into_input()).inspect_err(|error| {
        tracing::warn!("Rejected edit of transaction {transaction_id}: {error}");
    })?;

    let connection = lock_connection(&state.db_connection)?;
    let user = get_or_create_user(&identity, &connection)?;

    let duplicate_key = create_duplicate_key(
        &identity.external_id,
        &transaction.description,
        transaction.amount,
        transaction.transaction_type,
    );

    if state.duplicate_guard.is_duplicate(&duplicate_key) {
        tracing::warn!("Rejected duplicate edit {duplicate_key}");
        return Err(Error::DuplicateTransaction);
    }

    match update_transaction(transaction_id, user.id, &transaction, &connection) {
        Ok(0) => {
            tracing::error!(
                "Could not update transaction {transaction_id}: update returned zero rows affected"
            );
            Err(Error::UpdateMissingTransaction)
        }
        Ok(_) => {
            state.duplicate_guard.record(&duplicate_key);
            Ok(ActionResponse::ok())
        }
        Err(error) => {
            tracing::error!("Could not update transaction {transaction_id}: {error}");
            Err(error)
        }
    }
}
