//! Sets up the application's database.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    settings::create_user_settings_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the all of the database tables for the application.
///
/// Foreign key enforcement is switched on for `connection`.
///
/// # Errors
/// This function may return a [rusqlite::Error] if something went wrong creating the tables.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_user_settings_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
