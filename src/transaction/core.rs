//! Defines the core data models and database queries for transactions.

use rusqlite::{
    Connection, Row, ToSql, params,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::TransactionId,
    user::UserId,
    validation::{SanitizedTransaction, TransactionType},
};

// ============================================================================
// MODELS
// ============================================================================

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The user that recorded the transaction.
    pub user_id: UserId,
    /// A text description of what the transaction was for.
    pub description: String,
    /// The amount of money spent or earned, always positive.
    pub amount: f64,
    /// The category of the transaction, e.g. "Salário" or "Alimentação".
    pub category: String,
    /// Whether money was earned or spent.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Whether this is a recurring monthly expense.
    pub is_fixed: bool,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
}

impl ToSql for TransactionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error| FromSqlError::Other(Box::new(error)))
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// The number of rows changed by an update or delete.
pub type RowsAffected = usize;

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                description TEXT NOT NULL,
                amount REAL NOT NULL,
                category TEXT NOT NULL,
                type TEXT NOT NULL CHECK (type IN ('INCOME', 'EXPENSE')),
                is_fixed INTEGER NOT NULL DEFAULT 0,
                date TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the dashboard and the transaction list, which always filter by user.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Save a validated transaction for `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// for example when `user_id` does not refer to a real user.
pub fn create_transaction(
    user_id: UserId,
    transaction: &SanitizedTransaction,
    date: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "INSERT INTO \"transaction\" (user_id, description, amount, category, type, is_fixed, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_id, description, amount, category, type, is_fixed, date",
        )?
        .query_row(
            params![
                user_id.as_i64(),
                transaction.description,
                transaction.amount,
                transaction.category,
                transaction.transaction_type,
                transaction.is_fixed,
                date,
            ],
            map_transaction_row,
        )
        .map_err(Error::from)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, amount, category, type, is_fixed, date
             FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        )?
        .query_row((id, user_id.as_i64()), map_transaction_row)
        .map_err(Error::from)
}

/// Get all of the transactions owned by `user_id`, newest first.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn get_transactions_for_user(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, description, amount, category, type, is_fixed, date
             FROM \"transaction\" WHERE user_id = ?1
             ORDER BY date DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_transaction_row)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Overwrite the editable fields of transaction `id` if it is owned by `user_id`.
///
/// The transaction date is left unchanged. Returns zero if there is no such
/// transaction for the user.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserId,
    transaction: &SanitizedTransaction,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE \"transaction\"
            SET \
                description = ?1, \
                amount = ?2, \
                category = ?3, \
                type = ?4, \
                is_fixed = ?5 \
            WHERE id = ?6 AND user_id = ?7;",
            params![
                transaction.description,
                transaction.amount,
                transaction.category,
                transaction.transaction_type,
                transaction.is_fixed,
                id,
                user_id.as_i64(),
            ],
        )
        .map_err(Error::from)
}

/// Delete transaction `id` if it is owned by `user_id`.
///
/// Returns zero if there is no such transaction for the user.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
        )
        .map_err(Error::from)
}

/// Get the total number of transactions in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\";", [], |row| {
            row.get(0)
        })
        .map_err(|error| error.into())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        description: row.get(2)?,
        amount: row.get(3)?,
        category: row.get(4)?,
        transaction_type: row.get(5)?,
        is_fixed: row.get(6)?,
        date: row.get(7)?,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        Error,
        db::initialize,
        identity::ExternalIdentity,
        transaction::core::{
            count_transactions, create_transaction, delete_transaction, get_transaction,
            get_transactions_for_user, update_transaction,
        },
        user::{User, get_or_create_user},
        validation::{SanitizedTransaction, TransactionType},
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn create_test_user(external_id: &str, conn: &Connection) -> User {
        get_or_create_user(
            &ExternalIdentity {
                external_id: external_id.to_owned(),
                email: None,
                name: None,
            },
            conn,
        )
        .expect("could not create test user")
    }

    fn groceries(amount: f64) -> SanitizedTransaction {
        SanitizedTransaction {
            description: "Mercado".to_owned(),
            amount,
            category: "Alimentação".to_owned(),
            transaction_type: TransactionType::Expense,
            is_fixed: false,
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user = create_test_user("user_1", &conn);
        let date = datetime!(2025-10-05 12:30 UTC);

        let transaction = create_transaction(user.id, &groceries(12.3), date, &conn).unwrap();

        assert_eq!(transaction.user_id, user.id);
        assert_eq!(transaction.amount, 12.3);
        assert_eq!(transaction.transaction_type, TransactionType::Expense);
        assert_eq!(transaction.date, date);
        assert_eq!(get_transaction(transaction.id, user.id, &conn), Ok(transaction));
    }

    #[test]
    fn create_fails_for_missing_user() {
        let conn = get_test_connection();
        let missing_user = crate::user::UserId::new(42);

        let result = create_transaction(
            missing_user,
            &groceries(1.0),
            datetime!(2025-10-05 12:30 UTC),
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
    }

    #[test]
    fn get_is_scoped_to_owner() {
        let conn = get_test_connection();
        let owner = create_test_user("owner", &conn);
        let other = create_test_user("other", &conn);
        let transaction =
            create_transaction(owner.id, &groceries(5.0), datetime!(2025-10-05 0:00 UTC), &conn)
                .unwrap();

        assert_eq!(
            get_transaction(transaction.id, other.id, &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_is_newest_first_and_scoped_to_owner() {
        let conn = get_test_connection();
        let owner = create_test_user("owner", &conn);
        let other = create_test_user("other", &conn);
        create_transaction(owner.id, &groceries(1.0), datetime!(2025-10-01 9:00 UTC), &conn)
            .unwrap();
        create_transaction(owner.id, &groceries(2.0), datetime!(2025-10-03 9:00 UTC), &conn)
            .unwrap();
        create_transaction(other.id, &groceries(3.0), datetime!(2025-10-02 9:00 UTC), &conn)
            .unwrap();

        let transactions = get_transactions_for_user(owner.id, &conn).unwrap();

        let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [2.0, 1.0]);
    }

    #[test]
    fn update_changes_fields_but_not_date() {
        let conn = get_test_connection();
        let user = create_test_user("user_1", &conn);
        let date = datetime!(2025-10-05 12:30 UTC);
        let transaction = create_transaction(user.id, &groceries(10.0), date, &conn).unwrap();
        let edited = SanitizedTransaction {
            description: "Aluguel".to_owned(),
            amount: 1500.0,
            category: "Aluguel/Condomínio".to_owned(),
            transaction_type: TransactionType::Expense,
            is_fixed: true,
        };

        let rows_affected = update_transaction(transaction.id, user.id, &edited, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        let got = get_transaction(transaction.id, user.id, &conn).unwrap();
        assert_eq!(got.description, "Aluguel");
        assert_eq!(got.amount, 1500.0);
        assert!(got.is_fixed);
        assert_eq!(got.date, date);
    }

    #[test]
    fn update_of_other_users_transaction_affects_nothing() {
        let conn = get_test_connection();
        let owner = create_test_user("owner", &conn);
        let other = create_test_user("other", &conn);
        let transaction =
            create_transaction(owner.id, &groceries(10.0), datetime!(2025-10-05 0:00 UTC), &conn)
                .unwrap();

        let rows_affected =
            update_transaction(transaction.id, other.id, &groceries(99.0), &conn).unwrap();

        assert_eq!(rows_affected, 0);
        assert_eq!(
            get_transaction(transaction.id, owner.id, &conn).unwrap().amount,
            10.0
        );
    }

    #[test]
    fn delete_removes_transaction() {
        let conn = get_test_connection();
        let user = create_test_user("user_1", &conn);
        let transaction =
            create_transaction(user.id, &groceries(10.0), datetime!(2025-10-05 0:00 UTC), &conn)
                .unwrap();

        let rows_affected = delete_transaction(transaction.id, user.id, &conn).unwrap();

        assert_eq!(rows_affected, 1);
        assert_eq!(count_transactions(&conn).unwrap(), 0);
    }

    #[test]
    fn delete_of_other_users_transaction_affects_nothing() {
        let conn = get_test_connection();
        let owner = create_test_user("owner", &conn);
        let other = create_test_user("other", &conn);
        let transaction =
            create_transaction(owner.id, &groceries(10.0), datetime!(2025-10-05 0:00 UTC), &conn)
                .unwrap();

        let rows_affected = delete_transaction(transaction.id, other.id, &conn).unwrap();

        assert_eq!(rows_affected, 0);
        assert_eq!(count_transactions(&conn).unwrap(), 1);
    }

    #[test]
    fn transaction_serializes_with_wire_names() {
        let conn = get_test_connection();
        let user = create_test_user("user_1", &conn);
        let transaction =
            create_transaction(user.id, &groceries(10.0), datetime!(2025-10-05 12:00 UTC), &conn)
                .unwrap();

        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(json["type"], "EXPENSE");
        assert_eq!(json["isFixed"], false);
        assert_eq!(json["date"], "2025-10-05T12:00:00Z");
    }
}
