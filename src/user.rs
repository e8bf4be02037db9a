//! Code for creating the user table and provisioning users from their external identity.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, identity::ExternalIdentity};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's ID at the identity provider.
    pub external_id: String,
    /// The user's email address.
    pub email: Option<String>,
    /// The user's display name.
    pub name: Option<String>,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                email TEXT,
                name TEXT
                )",
        (),
    )?;

    Ok(())
}

/// Get the local user for `identity`, creating it on first use.
///
/// Users never register with this service directly, so the first request
/// from a new identity creates the matching local user.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_or_create_user(identity: &ExternalIdentity, connection: &Connection) -> Result<User, Error> {
    if let Some(user) = get_user_by_external_id(&identity.external_id, connection)? {
        return Ok(user);
    }

    tracing::info!("Creating local user for {}", identity.external_id);

    connection
        .prepare(
            "INSERT INTO user (external_id, email, name) VALUES (?1, ?2, ?3)
             RETURNING id, external_id, email, name",
        )?
        .query_row(
            (&identity.external_id, &identity.email, &identity.name),
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user whose identity provider ID is `external_id`, if there is one.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_user_by_external_id(
    external_id: &str,
    connection: &Connection,
) -> Result<Option<User>, Error> {
    connection
        .prepare("SELECT id, external_id, email, name FROM user WHERE external_id = :external_id")?
        .query_row(&[(":external_id", &external_id)], map_user_row)
        .optional()
        .map_err(Error::from)
}

/// Get the number of users in the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
#[cfg(test)]
pub fn count_users(connection: &Connection) -> Result<usize, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM user;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get(0)?),
        external_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
    })
}
